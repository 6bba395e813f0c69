//! In-process digest accumulators and the algorithm registry
//!
//! Accumulators are created by digest id (`sha256`, `crc32`, ...) and fed
//! chunk by chunk; the registry maps user-facing algorithm names to either
//! an accumulator id or a helper program.

use crate::Result;
use crate::error::DigestError;

mod algorithms;
mod registry;
mod traits;

pub use registry::{AlgorithmDescriptor, AlgorithmKind, AlgorithmRegistry};
pub use traits::{DigestAlgorithm, StreamingHasher};

/// A boxed streaming accumulator
pub type Accumulator = Box<dyn StreamingHasher>;

/// Create an accumulator for a digest id
pub fn create_accumulator(digest_id: &str) -> Result<Accumulator> {
    algorithms::lookup(digest_id)
        .map(|algo| algo.create_hasher())
        .ok_or_else(|| DigestError::unsupported(digest_id).into())
}

/// Hash an in-memory buffer with a single accumulator
pub fn hash_bytes(digest_id: &str, data: &[u8]) -> Result<String> {
    let mut accumulator = create_accumulator(digest_id)?;
    accumulator.update(data);
    Ok(accumulator.finalize())
}

/// Whether a digest id is implemented in-process
pub fn is_supported(digest_id: &str) -> bool {
    algorithms::lookup(digest_id).is_some()
}

/// Canonical ids of every in-process digest
pub fn supported_digests() -> Vec<&'static str> {
    algorithms::all().iter().map(|algo| algo.id()).collect()
}

/// Display name for a digest id, if supported
pub fn display_name(digest_id: &str) -> Option<&'static str> {
    algorithms::lookup(digest_id).map(|algo| algo.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use proptest::prelude::*;

    #[test]
    fn test_unknown_digest_is_unsupported() {
        let err = create_accumulator("md2").err().unwrap();
        assert!(matches!(
            err,
            Error::Digest(DigestError::UnsupportedDigest { .. })
        ));
    }

    #[test]
    fn test_supported_digests_listing() {
        let ids = supported_digests();
        for id in ["crc32", "md5", "sha1", "sha256", "sha384", "sha512", "blake2b"] {
            assert!(ids.contains(&id), "missing {id}");
            assert!(is_supported(id));
        }
        assert_eq!(display_name("sha384"), Some("SHA-384"));
    }

    #[test]
    fn test_hash_bytes_crc_reference() {
        assert_eq!(hash_bytes("crc32", b"").unwrap(), "00000000");
        assert_eq!(hash_bytes("crc32", b"123456789").unwrap(), "cbf43926");
    }

    proptest! {
        #[test]
        fn prop_chunked_updates_match_single_update(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            cuts in proptest::collection::vec(any::<usize>(), 0..8),
        ) {
            let mut offsets: Vec<usize> = cuts
                .into_iter()
                .map(|c| if data.is_empty() { 0 } else { c % (data.len() + 1) })
                .collect();
            offsets.push(0);
            offsets.push(data.len());
            offsets.sort_unstable();

            for id in supported_digests() {
                let mut chunked = create_accumulator(id).unwrap();
                for window in offsets.windows(2) {
                    chunked.update(&data[window[0]..window[1]]);
                }
                prop_assert_eq!(chunked.finalize(), hash_bytes(id, &data).unwrap());
            }
        }
    }
}
