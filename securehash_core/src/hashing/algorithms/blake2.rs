//! BLAKE2 digests

use super::RustCryptoAlgorithm;
use blake2::{Blake2b512, Blake2s256};

pub(crate) static BLAKE2B: RustCryptoAlgorithm<Blake2b512> =
    RustCryptoAlgorithm::new("blake2b", "BLAKE2b");
pub(crate) static BLAKE2S: RustCryptoAlgorithm<Blake2s256> =
    RustCryptoAlgorithm::new("blake2s", "BLAKE2s");
