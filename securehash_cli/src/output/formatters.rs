use super::{FileReport, OutputFormatter};
use crate::progress::format_bytes;
use anyhow::Result;
use colored::*;
use securehash_core::{DigestEntry, ResultMap};
use serde_json::{Value, json};

/// Text formatter for human-readable output
pub struct TextFormatter {
    use_color: bool,
}

impl TextFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn colorize(&self, text: &str, color: fn(&str) -> ColoredString) -> String {
        if self.use_color {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn entry(&self, entry: &DigestEntry) -> String {
        match entry {
            DigestEntry::Digest(digest) => self.colorize(digest, |s| s.cyan()),
            DigestEntry::Error(_) => self.colorize(&entry.to_string(), |s| s.red()),
        }
    }

    fn digest_lines(&self, results: &ResultMap, prefix: &str, output: &mut String) {
        for (name, entry) in results.sorted() {
            let name = self.colorize(name, |s| s.yellow());
            output.push_str(&format!("{prefix}{name}: {}\n", self.entry(entry)));
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_text(&self, results: &ResultMap) -> Result<String> {
        let mut output = String::new();
        self.digest_lines(results, "", &mut output);
        Ok(output)
    }

    fn format_files(&self, reports: &[FileReport]) -> Result<String> {
        let mut output = String::new();
        let multiple = reports.len() > 1;

        for report in reports {
            let prefix = if multiple {
                format!("{}: ", report.path().display())
            } else {
                String::new()
            };

            match report {
                FileReport::Hashed(result) => {
                    self.digest_lines(&result.digests, &prefix, &mut output);
                }
                FileReport::Failed { message, .. } => {
                    let line = format!("Error: {message}");
                    output.push_str(&format!("{prefix}{}\n", self.colorize(&line, |s| s.red())));
                }
                FileReport::Cancelled { .. } => {
                    output.push_str(&format!(
                        "{prefix}{}\n",
                        self.colorize("cancelled", |s| s.yellow())
                    ));
                }
            }
        }

        Ok(output)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &Value) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }

    fn report_value(report: &FileReport) -> Result<Value> {
        Ok(match report {
            FileReport::Hashed(result) => {
                let mut value = serde_json::to_value(result)?;
                value["status"] = json!("completed");
                value["size_human"] = json!(format_bytes(result.file_size));
                value
            }
            FileReport::Failed { path, message } => json!({
                "path": path.to_string_lossy(),
                "status": "failed",
                "error": message,
            }),
            FileReport::Cancelled { path } => json!({
                "path": path.to_string_lossy(),
                "status": "cancelled",
            }),
        })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_text(&self, results: &ResultMap) -> Result<String> {
        self.render(&serde_json::to_value(results)?)
    }

    fn format_files(&self, reports: &[FileReport]) -> Result<String> {
        let values = reports
            .iter()
            .map(Self::report_value)
            .collect::<Result<Vec<_>>>()?;

        if values.len() == 1 {
            self.render(&values[0])
        } else {
            self.render(&Value::Array(values))
        }
    }
}

/// CSV formatter, one row per digest
#[derive(Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn new() -> Self {
        Self
    }

    fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl OutputFormatter for CsvFormatter {
    fn format_text(&self, results: &ResultMap) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["algorithm", "hash"])?;
        for (name, entry) in results.sorted() {
            writer.write_record([name, entry.to_string().as_str()])?;
        }
        Self::finish(writer)
    }

    fn format_files(&self, reports: &[FileReport]) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["file", "algorithm", "hash", "size", "time_ms"])?;

        for report in reports {
            let file = report.path().display().to_string();
            match report {
                FileReport::Hashed(result) => {
                    let size = result.file_size.to_string();
                    let time_ms = result.duration.as_millis().to_string();
                    for (name, entry) in result.digests.sorted() {
                        writer.write_record([
                            file.as_str(),
                            name,
                            entry.to_string().as_str(),
                            size.as_str(),
                            time_ms.as_str(),
                        ])?;
                    }
                }
                FileReport::Failed { message, .. } => {
                    let hash = format!("Error: {message}");
                    writer.write_record([file.as_str(), "", hash.as_str(), "", ""])?;
                }
                FileReport::Cancelled { .. } => {
                    writer.write_record([file.as_str(), "", "cancelled", "", ""])?;
                }
            }
        }

        Self::finish(writer)
    }
}
