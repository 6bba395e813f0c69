//! Engine tuning knobs

use crate::Result;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Read size of the in-process pass
    pub chunk_size: usize,
    /// Size of each write into a helper's stdin
    pub process_chunk_size: usize,
    /// Minimum percentage advance between two reports of a read pass
    pub progress_step: u8,
    /// Per-algorithm deadline on the text path
    pub text_timeout_secs: u64,
    /// How long a helper gets to exit after a polite termination request
    pub terminate_grace_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16 * 1024 * 1024,        // 16MB read chunks
            process_chunk_size: 8 * 1024 * 1024, // 8MB pipe writes
            progress_step: 5,
            text_timeout_secs: 30,
            terminate_grace_ms: 1000,
        }
    }
}

impl EngineConfig {
    /// Create a test configuration
    pub fn test() -> Self {
        Self {
            chunk_size: 1024,         // 1KB chunks for faster tests
            process_chunk_size: 1024, // many small writes exercise the pump
            progress_step: 5,
            text_timeout_secs: 5,
            terminate_grace_ms: 200,
        }
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ValidationError::invalid_configuration("chunk_size must be > 0").into());
        }
        if self.process_chunk_size == 0 {
            return Err(
                ValidationError::invalid_configuration("process_chunk_size must be > 0").into(),
            );
        }
        if self.progress_step == 0 || self.progress_step > 100 {
            return Err(ValidationError::invalid_configuration(
                "progress_step must be between 1 and 100",
            )
            .into());
        }
        if self.text_timeout_secs == 0 {
            return Err(
                ValidationError::invalid_configuration("text_timeout_secs must be > 0").into(),
            );
        }
        Ok(())
    }

    pub fn text_timeout(&self) -> Duration {
        Duration::from_secs(self.text_timeout_secs)
    }

    pub fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.terminate_grace_ms)
    }
}
