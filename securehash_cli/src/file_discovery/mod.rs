//! File discovery for the `file` command
//!
//! Command line paths are expanded into the list of regular files to hash.
//! Files named explicitly are always kept; directories are walked and their
//! entries filtered with include/exclude glob patterns.

mod filter;
mod walker;

pub use filter::PathFilter;
pub use walker::{FileDiscovery, FileDiscoveryOptions};

use std::path::PathBuf;

/// Error type for file discovery operations
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Result type for file discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Expand command line paths into files, preserving argument order
///
/// Duplicate paths are dropped after their first occurrence.
pub fn expand_paths(paths: &[PathBuf], options: &FileDiscoveryOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for path in paths {
        if path.is_dir() {
            for file in FileDiscovery::new(path, options.clone())? {
                let file = file?;
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        } else if path.exists() {
            if seen.insert(path.clone()) {
                files.push(path.clone());
            }
        } else {
            return Err(DiscoveryError::PathNotFound(path.clone()));
        }
    }

    log::debug!("Expanded {} argument(s) into {} file(s)", paths.len(), files.len());
    Ok(files)
}
