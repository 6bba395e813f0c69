//! Stand-ins for the engine's collaborators

#[cfg(unix)]
mod helpers;
mod progress;

#[cfg(unix)]
pub use helpers::{FakeHelper, pid_alive};
pub use progress::RecordingProvider;
