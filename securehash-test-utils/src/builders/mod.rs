//! Builders for test inputs

mod test_files;

pub use test_files::{TestFileBuilder, pattern};
