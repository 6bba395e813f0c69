//! Validation related error types

use thiserror::Error;

/// Registry and configuration validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A registry record could not be turned into a descriptor
    #[error("Invalid algorithm record '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    /// Two registry records share a name
    #[error("Duplicate algorithm name: {name}")]
    DuplicateName { name: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    /// Create an invalid descriptor error
    pub fn invalid_descriptor(name: &str, reason: &str) -> Self {
        Self::InvalidDescriptor {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a duplicate name error
    pub fn duplicate_name(name: &str) -> Self {
        Self::DuplicateName {
            name: name.to_string(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_error() {
        let error = ValidationError::invalid_configuration("chunk_size must be > 0");
        assert!(error.to_string().contains("Invalid configuration"));
        assert!(error.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_invalid_descriptor_error() {
        let error = ValidationError::invalid_descriptor("Tiger", "empty executable");
        assert!(error.to_string().contains("Tiger"));
        assert!(error.to_string().contains("empty executable"));
    }

    #[test]
    fn test_missing_field_error() {
        let error = ValidationError::missing_field("hashlib_name");
        assert!(error.to_string().contains("hashlib_name"));
    }
}
