//! Result containers shared by the text and file paths

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal outcome of a cancellable operation
///
/// Cancellation is a normal ending, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// The completed value, if any
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

/// One entry of a [`ResultMap`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestEntry {
    Digest(String),
    Error(String),
}

impl DigestEntry {
    pub fn digest(&self) -> Option<&str> {
        match self {
            DigestEntry::Digest(digest) => Some(digest),
            DigestEntry::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DigestEntry::Error(_))
    }
}

impl std::fmt::Display for DigestEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestEntry::Digest(digest) => f.write_str(digest),
            DigestEntry::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Algorithm name to digest (or error marker)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultMap {
    entries: HashMap<String, DigestEntry>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_digest(&mut self, name: impl Into<String>, digest: impl Into<String>) {
        self.entries
            .insert(name.into(), DigestEntry::Digest(digest.into()));
    }

    pub fn insert_error(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.entries
            .insert(name.into(), DigestEntry::Error(message.into()));
    }

    pub fn get(&self, name: &str) -> Option<&DigestEntry> {
        self.entries.get(name)
    }

    /// Digest for `name`, `None` if absent or failed
    pub fn digest(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(DigestEntry::digest)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn has_errors(&self) -> bool {
        self.entries.values().any(DigestEntry::is_error)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DigestEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Entries sorted by algorithm name
    pub fn sorted(&self) -> Vec<(&str, &DigestEntry)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub(crate) fn merge(&mut self, other: ResultMap) {
        self.entries.extend(other.entries);
    }
}

/// Read accounting for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilePassStats {
    /// Number of times the file was read start to end
    pub read_passes: u32,
    /// Bytes read across all passes
    pub bytes_read: u64,
}

/// Everything produced by one completed file hash
#[derive(Debug, Clone, Serialize)]
pub struct FileHashResult {
    pub path: PathBuf,
    pub file_size: u64,
    pub digests: ResultMap,
    pub stats: FilePassStats,
    #[serde(serialize_with = "serialize_millis", rename = "duration_ms")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(duration.as_millis() as u64)
}
