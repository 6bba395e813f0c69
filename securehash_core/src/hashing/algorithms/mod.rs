//! In-process digest implementations

use super::traits::{DigestAlgorithm, StreamingHasher};
use sha2::Digest;
use std::fmt::Write;
use std::marker::PhantomData;

mod blake2;
mod crc32;
mod md5;
mod sha1;
mod sha2_family;
mod sha3;

/// Every in-process algorithm, in listing order
static BUILTIN: [&dyn DigestAlgorithm; 11] = [
    &crc32::CRC32,
    &md5::MD5,
    &sha1::SHA1,
    &sha2_family::SHA224,
    &sha2_family::SHA256,
    &sha2_family::SHA384,
    &sha2_family::SHA512,
    &sha3::SHA3_256,
    &sha3::SHA3_512,
    &blake2::BLAKE2B,
    &blake2::BLAKE2S,
];

/// Find an algorithm by digest id, ignoring case, `-` and `_`
pub(crate) fn lookup(digest_id: &str) -> Option<&'static dyn DigestAlgorithm> {
    let wanted = fold_id(digest_id);
    BUILTIN.iter().copied().find(|algo| fold_id(algo.id()) == wanted)
}

/// All built-in algorithms
pub(crate) fn all() -> &'static [&'static dyn DigestAlgorithm] {
    &BUILTIN
}

fn fold_id(id: &str) -> String {
    id.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Adapter exposing any RustCrypto `Digest` as a [`DigestAlgorithm`]
pub struct RustCryptoAlgorithm<D> {
    id: &'static str,
    display_name: &'static str,
    _digest: PhantomData<fn() -> D>,
}

impl<D> RustCryptoAlgorithm<D> {
    const fn new(id: &'static str, display_name: &'static str) -> Self {
        Self {
            id,
            display_name,
            _digest: PhantomData,
        }
    }
}

struct DigestHasher<D> {
    hasher: D,
}

impl<D: Digest + Send> StreamingHasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn finalize(self: Box<Self>) -> String {
        let this = *self;
        to_hex(&this.hasher.finalize())
    }
}

impl<D: Digest + Send + 'static> DigestAlgorithm for RustCryptoAlgorithm<D> {
    fn id(&self) -> &'static str {
        self.id
    }

    fn display_name(&self) -> &'static str {
        self.display_name
    }

    fn create_hasher(&self) -> Box<dyn StreamingHasher> {
        Box::new(DigestHasher { hasher: D::new() })
    }
}
