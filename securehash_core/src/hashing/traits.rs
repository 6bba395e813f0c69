//! Core traits for the in-process digest accumulators

/// An in-process digest algorithm that can mint streaming accumulators
pub trait DigestAlgorithm: Send + Sync {
    /// Canonical digest id (hashlib naming, e.g. `sha256`, `crc32`)
    fn id(&self) -> &'static str;

    /// Display name for user interfaces
    fn display_name(&self) -> &'static str;

    /// Create a new streaming accumulator
    fn create_hasher(&self) -> Box<dyn StreamingHasher>;

    /// Calculate the digest of an in-memory buffer
    fn hash_bytes(&self, data: &[u8]) -> String {
        let mut hasher = self.create_hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Streaming digest accumulator
///
/// Feeding the same bytes in any chunking must produce the same digest as a
/// single `update` over the concatenation.
pub trait StreamingHasher: Send {
    /// Update the accumulator with the next chunk
    fn update(&mut self, data: &[u8]);

    /// Finalize the calculation and return the lowercase hex digest
    fn finalize(self: Box<Self>) -> String;
}
