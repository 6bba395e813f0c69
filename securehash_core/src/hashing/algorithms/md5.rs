//! MD5 digest

use super::RustCryptoAlgorithm;
use md5::Md5;

pub(crate) static MD5: RustCryptoAlgorithm<Md5> = RustCryptoAlgorithm::new("md5", "MD5");
