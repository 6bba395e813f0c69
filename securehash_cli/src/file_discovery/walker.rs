//! Directory walking for file discovery
//!
//! Entries stream out of walkdir in file-name order and are filtered lazily,
//! so very large trees never sit in memory at once.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{DiscoveryError, Result, filter::PathFilter};

/// Options for file discovery
#[derive(Debug, Clone, Default)]
pub struct FileDiscoveryOptions {
    /// Patterns to include (glob patterns)
    pub include_patterns: Vec<String>,
    /// Patterns to exclude (glob patterns, override includes)
    pub exclude_patterns: Vec<String>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Follow symbolic links
    pub follow_links: bool,
}

impl FileDiscoveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

/// Streaming iterator over the regular files under a directory
pub struct FileDiscovery {
    walker: walkdir::IntoIter,
    filter: PathFilter,
}

impl FileDiscovery {
    pub fn new(path: &Path, options: FileDiscoveryOptions) -> Result<Self> {
        if !path.exists() {
            return Err(DiscoveryError::PathNotFound(path.to_path_buf()));
        }

        let filter = PathFilter::new(&options.include_patterns, &options.exclude_patterns)?;

        let mut walker = WalkDir::new(path)
            .follow_links(options.follow_links)
            .sort_by_file_name();
        if !options.recursive {
            walker = walker.max_depth(1);
        }

        Ok(Self {
            walker: walker.into_iter(),
            filter,
        })
    }

    fn accepts(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_file() && self.filter.accepts(entry.path())
    }
}

impl Iterator for FileDiscovery {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) if self.accepts(&entry) => return Some(Ok(entry.into_path())),
                Ok(_) => continue,
                Err(e) => {
                    // Unreadable entries are skipped, not fatal
                    log::warn!("Walk error: {e}");
                    continue;
                }
            }
        }
    }
}
