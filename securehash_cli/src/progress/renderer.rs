//! Progress rendering for the CLI
//!
//! This module handles the visual rendering of progress updates,
//! converting ProgressUpdate messages into terminal output.

use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use securehash_core::ProgressUpdate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Render progress updates from a channel until it closes
pub async fn render_progress(mut rx: mpsc::Receiver<ProgressUpdate>) {
    let mut renderer = ProgressRenderer::new();

    while let Some(update) = rx.recv().await {
        renderer.handle_update(update);
    }

    renderer.finish();
}

/// Progress renderer that manages visual progress display
pub struct ProgressRenderer {
    multi: MultiProgress,
    file_bars: HashMap<PathBuf, ProgressBar>,
    batch_bar: Option<ProgressBar>,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            file_bars: HashMap::new(),
            batch_bar: None,
        }
    }

    /// Handle a progress update
    pub fn handle_update(&mut self, update: ProgressUpdate) {
        match update {
            ProgressUpdate::Hash {
                path,
                pass,
                percent,
                overall,
            } => {
                self.update_hash_progress(path, &pass, percent, overall);
            }

            ProgressUpdate::Batch {
                current,
                total,
                current_file,
            } => {
                self.update_batch_progress(current, total, current_file.as_deref());
            }

            ProgressUpdate::Status { message } => {
                self.show_status(&message);
            }
        }
    }

    /// Number of per-file bars created so far
    pub fn file_bar_count(&self) -> usize {
        self.file_bars.len()
    }

    /// Overall percentage currently shown for a file
    pub fn file_position(&self, path: &Path) -> Option<u64> {
        self.file_bars.get(path).map(|pb| pb.position())
    }

    fn update_hash_progress(&mut self, path: PathBuf, pass: &str, percent: u8, overall: u8) {
        let multi = &self.multi;
        let pb = self.file_bars.entry(path.clone()).or_insert_with(|| {
            let pb = multi.add(ProgressBar::new(100));
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% | {prefix}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );

            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            pb.set_message(format!("{}: {}", "Hashing".bold(), file_name.cyan()));
            pb
        });

        // Overall only moves forward within a file
        if u64::from(overall) > pb.position() {
            pb.set_position(u64::from(overall));
        }
        pb.set_prefix(format!("{} {percent}%", pass.yellow()));

        if overall >= 100 {
            pb.finish_with_message(format!(
                "{} {}",
                "✓".green(),
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown")
            ));
        }
    }

    fn update_batch_progress(&mut self, current: usize, total: usize, current_file: Option<&Path>) {
        if total < 2 {
            return;
        }

        let multi = &self.multi;
        let bar = self.batch_bar.get_or_insert_with(|| {
            let bar = multi.insert(0, ProgressBar::new(total as u64));
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{msg}\n[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            bar.set_message("Processing batch".bold().to_string());
            bar
        });

        // `current` is the 1-based index of the file being started
        bar.set_position(current.saturating_sub(1) as u64);
        if let Some(file) = current_file {
            bar.set_message(format!(
                "{}: {}",
                "Processing batch".bold(),
                file.display().to_string().cyan()
            ));
        }
    }

    fn show_status(&self, message: &str) {
        let _ = self.multi.println(format!("{} {}", "→".green(), message));
    }

    /// Finish all progress bars
    pub fn finish(self) {
        for (_, pb) in self.file_bars {
            if !pb.is_finished() {
                pb.abandon();
            }
        }

        if let Some(bar) = self.batch_bar {
            bar.set_position(bar.length().unwrap_or(0));
            bar.finish_with_message("✓ Batch complete".green().to_string());
        }
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new()
    }
}
