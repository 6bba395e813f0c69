//! Progress reporting module for the CLI
//!
//! Core progress updates travel over a channel to a rendering task that
//! draws them with indicatif.

pub mod provider;
pub mod renderer;
pub mod utils;

pub use provider::create_progress_infrastructure;
pub use renderer::{ProgressRenderer, render_progress};
pub use utils::{format_bytes, format_duration, format_throughput};
