//! Test file builder backed by a temporary directory

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates input files in a private temporary directory
///
/// Everything is removed when the builder is dropped.
pub struct TestFileBuilder {
    dir: TempDir,
    generated_files: Vec<PathBuf>,
}

impl TestFileBuilder {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
            generated_files: Vec::new(),
        })
    }

    /// Directory the files are written to
    pub fn base_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `name`
    pub fn with_content(&mut self, name: &str, content: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        self.generated_files.push(path.clone());
        Ok(path)
    }

    /// Write `size` bytes of a repeating, position-dependent pattern
    pub fn generate_test_file(&mut self, name: &str, size: usize) -> std::io::Result<PathBuf> {
        self.with_content(name, &pattern(size))
    }

    pub fn generate_empty_file(&mut self, name: &str) -> std::io::Result<PathBuf> {
        self.with_content(name, b"")
    }

    /// Paths of every file written so far, in creation order
    pub fn generated_files(&self) -> &[PathBuf] {
        &self.generated_files
    }
}

/// Deterministic test content of `size` bytes
pub fn pattern(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}
