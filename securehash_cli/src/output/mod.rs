mod formatters;

pub use formatters::{CsvFormatter, JsonFormatter, TextFormatter};

use anyhow::Result;
use securehash_core::{FileHashResult, FileOutcome, Outcome, ResultMap};
use std::path::PathBuf;

/// Output format enumeration
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// What happened to one input file, ready for printing
#[derive(Debug, Clone)]
pub enum FileReport {
    Hashed(FileHashResult),
    Failed { path: PathBuf, message: String },
    Cancelled { path: PathBuf },
}

impl FileReport {
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileReport::Hashed(result) => &result.path,
            FileReport::Failed { path, .. } | FileReport::Cancelled { path } => path,
        }
    }
}

impl From<FileOutcome> for FileReport {
    fn from(outcome: FileOutcome) -> Self {
        match outcome.outcome {
            Ok(Outcome::Completed(result)) => FileReport::Hashed(result),
            Ok(Outcome::Cancelled) => FileReport::Cancelled { path: outcome.path },
            Err(e) => FileReport::Failed {
                path: outcome.path,
                message: e.to_string(),
            },
        }
    }
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Format the result of hashing one text input
    fn format_text(&self, results: &ResultMap) -> Result<String>;

    /// Format the reports of a file run
    fn format_files(&self, reports: &[FileReport]) -> Result<String>;
}

/// Create a formatter based on output format
pub fn create_formatter(format: OutputFormat, use_color: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(use_color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Csv => Box::new(CsvFormatter::new()),
    }
}
