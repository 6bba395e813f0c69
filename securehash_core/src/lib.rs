//! SecureHash Core Library
//!
//! Multi-algorithm hashing of text and files. In-process digests share a
//! single read pass over each file; helper programs that read the input on
//! stdin and print a digest are driven one at a time, with progress reporting
//! and cooperative cancellation throughout.

pub mod batch;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod process;
pub mod progress;
pub mod results;

// Re-export main types
pub use batch::{BatchConfig, BatchCoordinator, BatchHandle, BatchSummary, FileOutcome};
pub use cancel::CancelToken;
pub use config::EngineConfig;
pub use engine::HashEngine;
pub use error::{Error, Result};
pub use hashing::{
    Accumulator, AlgorithmDescriptor, AlgorithmKind, AlgorithmRegistry, create_accumulator,
    supported_digests,
};
pub use process::parse_progress_line;
pub use progress::{
    CallbackProvider, ChannelAdapter, NullProvider, ProgressProvider, ProgressUpdate,
    SharedProvider,
};
pub use results::{DigestEntry, FileHashResult, FilePassStats, Outcome, ResultMap};
