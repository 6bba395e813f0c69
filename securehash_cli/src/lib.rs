//! SecureHash command line front end
//!
//! The binaries are thin wrappers; everything they share lives here so the
//! integration tests can reach it.

pub mod config;
pub mod file_discovery;
pub mod helper;
pub mod output;
pub mod paths;
pub mod progress;
pub mod terminal;
