//! SHA-3 digests

use super::RustCryptoAlgorithm;
use sha3::{Sha3_256, Sha3_512};

pub(crate) static SHA3_256: RustCryptoAlgorithm<Sha3_256> =
    RustCryptoAlgorithm::new("sha3_256", "SHA3-256");
pub(crate) static SHA3_512: RustCryptoAlgorithm<Sha3_512> =
    RustCryptoAlgorithm::new("sha3_512", "SHA3-512");
