//! Background batch hashing
//!
//! Files are hashed one after another on a spawned tokio task; each result is
//! streamed back through a [`BatchHandle`] as soon as it is available.

use crate::engine::HashEngine;
use crate::progress::{ProgressProvider, ProgressUpdate};
use crate::results::{FileHashResult, Outcome};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

/// Configuration for batch processing
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Keep going after a file fails
    pub continue_on_error: bool,
    /// Results buffered before the batch task waits for the consumer
    pub channel_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            channel_capacity: 64,
        }
    }
}

/// Result for one file of a batch
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub outcome: Result<Outcome<FileHashResult>>,
}

/// Totals for a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Files never attempted because an earlier failure stopped the batch
    pub skipped: usize,
    pub total_time: Duration,
}

/// Launches batches on top of a shared engine
pub struct BatchCoordinator {
    engine: Arc<HashEngine>,
    config: BatchConfig,
}

impl BatchCoordinator {
    pub fn new(engine: Arc<HashEngine>) -> Self {
        Self {
            engine,
            config: BatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Start hashing `files` in the background
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        self,
        files: Vec<PathBuf>,
        algorithms: Vec<String>,
        progress: Arc<dyn ProgressProvider>,
    ) -> BatchHandle {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let engine = Arc::clone(&self.engine);
        let config = self.config;

        let task = tokio::spawn(async move {
            let start = Instant::now();
            let total = files.len();
            let mut summary = BatchSummary {
                total,
                ..BatchSummary::default()
            };
            let mut stopped = false;

            for (index, path) in files.into_iter().enumerate() {
                if stopped {
                    summary.skipped += 1;
                    continue;
                }

                progress.report(ProgressUpdate::Batch {
                    current: index + 1,
                    total,
                    current_file: Some(path.clone()),
                });

                let outcome = if engine.is_cancelled() {
                    Ok(Outcome::Cancelled)
                } else {
                    engine
                        .hash_file(&path, &algorithms, progress.as_ref())
                        .await
                };

                match &outcome {
                    Ok(Outcome::Completed(_)) => summary.completed += 1,
                    Ok(Outcome::Cancelled) => summary.cancelled += 1,
                    Err(e) => {
                        log::warn!("Failed to hash {path:?}: {e}");
                        summary.failed += 1;
                        if !config.continue_on_error {
                            stopped = true;
                        }
                    }
                }

                // A dropped receiver only means nobody is listening any more
                let _ = tx.send(FileOutcome { path, outcome }).await;
            }

            progress.complete();
            summary.total_time = start.elapsed();
            log::debug!(
                "Batch finished: {} completed, {} failed, {} cancelled, {} skipped",
                summary.completed,
                summary.failed,
                summary.cancelled,
                summary.skipped
            );
            summary
        });

        BatchHandle {
            engine: self.engine,
            rx,
            task,
        }
    }
}

/// Handle onto a running batch
pub struct BatchHandle {
    engine: Arc<HashEngine>,
    rx: mpsc::Receiver<FileOutcome>,
    task: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Next finished file, `None` once the batch is done
    pub async fn next(&mut self) -> Option<FileOutcome> {
        self.rx.recv().await
    }

    /// Cancel the batch; see [`HashEngine::cancel`]
    pub async fn cancel(&self) -> bool {
        self.engine.cancel().await
    }

    /// Wait for the batch to finish, discarding unread results
    pub async fn join(self) -> std::result::Result<BatchSummary, JoinError> {
        drop(self.rx);
        self.task.await
    }
}
