//! Test utilities for SecureHash
//!
//! This crate provides file builders, scripted helper programs and a
//! recording progress provider for testing the hashing engine.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::TestFileBuilder;
#[cfg(unix)]
pub use mocks::{FakeHelper, pid_alive};
pub use mocks::RecordingProvider;
