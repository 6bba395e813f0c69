//! External helper errors

use std::time::Duration;
use thiserror::Error;

/// Failures of an out-of-process digest helper
#[derive(Error, Debug)]
pub enum ToolError {
    /// The helper could not be started, exited non-zero or produced no digest
    #[error("External tool for '{algorithm}' failed: {reason}")]
    ExternalToolFailure { algorithm: String, reason: String },

    /// The helper did not finish within the bounded wait
    #[error("External tool for '{algorithm}' timed out after {}s", .after.as_secs_f64())]
    Timeout { algorithm: String, after: Duration },
}

impl ToolError {
    /// Create an external tool failure
    pub fn failed(algorithm: &str, reason: impl Into<String>) -> Self {
        Self::ExternalToolFailure {
            algorithm: algorithm.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(algorithm: &str, after: Duration) -> Self {
        Self::Timeout {
            algorithm: algorithm.to_string(),
            after,
        }
    }

    /// Algorithm whose helper failed
    pub fn algorithm(&self) -> &str {
        match self {
            Self::ExternalToolFailure { algorithm, .. } | Self::Timeout { algorithm, .. } => {
                algorithm
            }
        }
    }
}
