//! Digest selection errors

use thiserror::Error;

/// Errors raised while resolving an algorithm to an accumulator
#[derive(Error, Debug)]
pub enum DigestError {
    /// The digest id is not implemented in-process
    #[error("Unsupported digest '{digest_id}'")]
    UnsupportedDigest { digest_id: String },

    /// The algorithm name is not present in the registry
    #[error("Unknown algorithm '{name}'")]
    UnknownAlgorithm { name: String },
}

impl DigestError {
    /// Create an unsupported digest error
    pub fn unsupported(digest_id: &str) -> Self {
        Self::UnsupportedDigest {
            digest_id: digest_id.to_string(),
        }
    }

    /// Create an unknown algorithm error
    pub fn unknown_algorithm(name: &str) -> Self {
        Self::UnknownAlgorithm {
            name: name.to_string(),
        }
    }

    /// The id or name the error refers to
    pub fn name(&self) -> &str {
        match self {
            Self::UnsupportedDigest { digest_id } => digest_id,
            Self::UnknownAlgorithm { name } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_digest() {
        let error = DigestError::unsupported("md2");
        assert!(error.to_string().contains("Unsupported digest"));
        assert_eq!(error.name(), "md2");
    }

    #[test]
    fn test_unknown_algorithm() {
        let error = DigestError::unknown_algorithm("SHA-999");
        assert!(error.to_string().contains("SHA-999"));
    }
}
