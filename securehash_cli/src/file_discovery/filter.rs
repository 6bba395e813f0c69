//! Include/exclude filtering with compiled glob sets

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

use super::{DiscoveryError, Result};

/// Include and exclude patterns for discovered files
///
/// Rules, in order:
/// 1. A path matching any exclude pattern is rejected
/// 2. With no include patterns every remaining path is accepted
/// 3. Otherwise a path must match an include pattern
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    pub fn new(include_patterns: &[String], exclude_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include_patterns)?,
            exclude: compile(exclude_patterns)?,
        })
    }

    /// Check `path` against the patterns
    ///
    /// Patterns are tried against the full path and against the file name,
    /// so `*.bin` and `**/cache/*` both work as expected.
    pub fn accepts(&self, path: &Path) -> bool {
        if let Some(exclude) = &self.exclude
            && matches(exclude, path)
        {
            return false;
        }

        match &self.include {
            Some(include) => matches(include, path),
            None => true,
        }
    }

    pub fn has_patterns(&self) -> bool {
        self.include.is_some() || self.exclude.is_some()
    }
}

fn matches(set: &GlobSet, path: &Path) -> bool {
    set.is_match(path) || path.file_name().is_some_and(|name| set.is_match(name))
}

fn compile(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| DiscoveryError::InvalidPattern(format!("{pattern}: {e}")))?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| DiscoveryError::InvalidPattern(e.to_string()))
}
