//! SHA-2 family digests

use super::RustCryptoAlgorithm;
use sha2::{Sha224, Sha256, Sha384, Sha512};

pub(crate) static SHA224: RustCryptoAlgorithm<Sha224> =
    RustCryptoAlgorithm::new("sha224", "SHA-224");
pub(crate) static SHA256: RustCryptoAlgorithm<Sha256> =
    RustCryptoAlgorithm::new("sha256", "SHA-256");
pub(crate) static SHA384: RustCryptoAlgorithm<Sha384> =
    RustCryptoAlgorithm::new("sha384", "SHA-384");
pub(crate) static SHA512: RustCryptoAlgorithm<Sha512> =
    RustCryptoAlgorithm::new("sha512", "SHA-512");
