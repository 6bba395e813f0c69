//! Error types for the SecureHash core library
//!
//! Errors are grouped by where they originate so callers can match on the
//! category first and drill down only when they need to.

use thiserror::Error;

pub mod digest;
pub mod io;
pub mod tool;
pub mod validation;

pub use self::digest::DigestError;
pub use self::io::{IoError, IoErrorKind};
pub use self::tool::ToolError;
pub use self::validation::ValidationError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the SecureHash core library
///
/// - I/O errors: the input file could not be opened, sized or read
/// - Digest errors: unknown algorithm names or unsupported digest ids
/// - Tool errors: an external helper failed or exceeded its wait budget
/// - Validation errors: malformed registry records or configuration
///
/// Cancellation is deliberately absent: a cancelled operation returns
/// [`crate::Outcome::Cancelled`], never an `Err`.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Digest selection errors
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// External helper errors
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Name of the algorithm this error is attributed to, if any
    pub fn algorithm(&self) -> Option<&str> {
        match self {
            Error::Digest(err) => Some(err.name()),
            Error::Tool(err) => Some(err.algorithm()),
            Error::Io(_) | Error::Validation(_) => None,
        }
    }

    /// Whether this is the bounded-wait expiry of the text path
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Tool(ToolError::Timeout { .. }))
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}
