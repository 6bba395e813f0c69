//! SHA-1 digest

use super::RustCryptoAlgorithm;
use sha1::Sha1;

pub(crate) static SHA1: RustCryptoAlgorithm<Sha1> = RustCryptoAlgorithm::new("sha1", "SHA-1");
