//! File and text hashing engine
//!
//! [`HashEngine::hash_file`] splits the requested algorithms into in-process
//! accumulators, which share one read pass over the file, and helper
//! programs, which each get their own sequential pass. The first failure
//! aborts the whole file. [`HashEngine::hash_text`] instead isolates every
//! algorithm and records failures as error entries.

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::error::{IoError, ToolError};
use crate::hashing::{self, Accumulator, AlgorithmDescriptor, AlgorithmKind, AlgorithmRegistry};
use crate::process::{self, ChildSlot, HelperInvocation};
use crate::progress::{ProgressProvider, ProgressState, ProgressUpdate};
use crate::results::{FileHashResult, FilePassStats, Outcome, ResultMap};
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, ReadBuf};

/// Extra time `cancel()` allows beyond the termination grace period
const CANCEL_SLACK: Duration = Duration::from_secs(1);

/// Multi-algorithm hashing engine
///
/// An engine runs at most one helper process at a time. Cancellation is
/// sticky: once [`HashEngine::cancel`] has been called every file operation
/// returns [`Outcome::Cancelled`] until [`HashEngine::reset_cancellation`].
pub struct HashEngine {
    registry: Arc<AlgorithmRegistry>,
    config: EngineConfig,
    cancel: CancelToken,
    child_slot: ChildSlot,
    process_gate: tokio::sync::Mutex<()>,
}

impl HashEngine {
    pub fn new(registry: Arc<AlgorithmRegistry>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            config,
            cancel: CancelToken::new(),
            child_slot: ChildSlot::default(),
            process_gate: tokio::sync::Mutex::new(()),
        })
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A handle onto the engine's cancellation flag
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// PID of the helper currently running, if any
    pub fn live_child_pid(&self) -> Option<u32> {
        self.child_slot.current()
    }

    /// Request cancellation and wait for any live helper to go away
    ///
    /// The task running the helper terminates it on its own. If the slot is
    /// still occupied after the grace period the child is killed directly.
    /// Returns `true` when no helper is left running.
    pub async fn cancel(&self) -> bool {
        self.cancel.cancel();

        let bound = self.config.terminate_grace() + CANCEL_SLACK;
        if tokio::time::timeout(bound, self.child_slot.wait_empty())
            .await
            .is_ok()
        {
            return true;
        }

        if let Some(pid) = self.child_slot.current() {
            log::warn!("Helper pid {pid} still running after cancel, killing it");
            #[cfg(unix)]
            // SAFETY: the slot is cleared as soon as the child is reaped
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGKILL);
            }
        }
        tokio::time::timeout(CANCEL_SLACK, self.child_slot.wait_empty())
            .await
            .is_ok()
    }

    /// Lower the cancellation flag so new work can start
    pub fn reset_cancellation(&self) {
        self.cancel.reset();
    }

    /// Hash one file with every requested algorithm
    ///
    /// Unknown names fail before the file is touched. Returns
    /// `Outcome::Cancelled` as soon as cancellation is observed; any helper
    /// that was running has been reaped by then.
    pub async fn hash_file<S: AsRef<str>>(
        &self,
        path: &Path,
        algorithms: &[S],
        progress: &dyn ProgressProvider,
    ) -> Result<Outcome<FileHashResult>> {
        let start = Instant::now();
        let descriptors = self.resolve_all(algorithms)?;

        let mut fast = Vec::new();
        let mut slow = Vec::new();
        for descriptor in descriptors {
            match descriptor.kind() {
                AlgorithmKind::InProcess { digest_id } => {
                    let accumulator = hashing::create_accumulator(digest_id)?;
                    fast.push((descriptor.name(), accumulator));
                }
                AlgorithmKind::ExternalProcess { executable, args } => {
                    slow.push((descriptor.name(), executable.as_path(), args.as_slice()));
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let (file, file_size) = open_file(path).await?;
        log::debug!(
            "Hashing {path:?} ({file_size} bytes): {} in-process, {} external",
            fast.len(),
            slow.len()
        );

        let tracker = PassTracker {
            progress,
            path,
            total_passes: u32::from(!fast.is_empty()) + slow.len() as u32,
        };
        let mut digests = ResultMap::new();
        let mut stats = FilePassStats::default();
        let mut passes_done = 0;

        if !fast.is_empty() {
            let label = fast
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ");
            let pass = self
                .in_process_pass(file, file_size, fast, |percent| {
                    tracker.report(&label, percent, passes_done)
                })
                .await
                .map_err(|e| with_source_path(e, path))?;
            match pass {
                Outcome::Completed((pass_digests, bytes)) => {
                    digests.merge(pass_digests);
                    stats.read_passes += 1;
                    stats.bytes_read += bytes;
                    passes_done += 1;
                }
                Outcome::Cancelled => return Ok(Outcome::Cancelled),
            }
        } else {
            drop(file);
        }

        for (name, executable, args) in slow {
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }

            let _gate = self.process_gate.lock().await;
            let (file, _) = open_file(path).await?;
            let mut reader = CountingReader::new(file);
            let invocation = HelperInvocation {
                algorithm: name,
                executable,
                args,
                size_hint: Some(file_size),
                source: Some(path),
                chunk_size: self.config.process_chunk_size,
                progress_step: self.config.progress_step,
                terminate_grace: self.config.terminate_grace(),
                deadline: None,
            };

            let mut last_sent = None;
            let outcome = {
                let mut on_progress = |percent: u8| {
                    last_sent = Some(percent);
                    tracker.report(name, percent, passes_done);
                };
                process::run_helper(
                    invocation,
                    &mut reader,
                    &self.cancel,
                    &self.child_slot,
                    &mut on_progress,
                )
                .await?
            };

            match outcome {
                Outcome::Completed(digest) => {
                    if last_sent != Some(100) {
                        tracker.report(name, 100, passes_done);
                    }
                    digests.insert_digest(name, digest);
                    stats.read_passes += 1;
                    stats.bytes_read += reader.count();
                    passes_done += 1;
                }
                Outcome::Cancelled => return Ok(Outcome::Cancelled),
            }
        }

        Ok(Outcome::Completed(FileHashResult {
            path: path.to_path_buf(),
            file_size,
            digests,
            stats,
            duration: start.elapsed(),
        }))
    }

    /// Hash a piece of text with every requested algorithm
    ///
    /// Never fails as a whole: unknown names, unsupported digests, helper
    /// failures and timeouts all become error entries for that algorithm.
    /// Not affected by the engine's cancellation flag.
    pub async fn hash_text<S: AsRef<str>>(&self, algorithms: &[S], text: &str) -> ResultMap {
        self.hash_bytes(algorithms, text.as_bytes()).await
    }

    /// Byte-level form of [`HashEngine::hash_text`]
    pub async fn hash_bytes<S: AsRef<str>>(&self, algorithms: &[S], data: &[u8]) -> ResultMap {
        let mut results = ResultMap::new();
        for name in dedupe(algorithms) {
            match self.hash_buffer_one(name, data).await {
                Ok(digest) => results.insert_digest(name, digest),
                Err(e) => {
                    log::debug!("Text hashing with '{name}' failed: {e}");
                    results.insert_error(name, e.to_string());
                }
            }
        }
        results
    }

    async fn hash_buffer_one(&self, name: &str, data: &[u8]) -> Result<String> {
        let descriptor = self.registry.resolve(name)?;
        match descriptor.kind() {
            AlgorithmKind::InProcess { digest_id } => hashing::hash_bytes(digest_id, data),
            AlgorithmKind::ExternalProcess { executable, args } => {
                let _gate = self.process_gate.lock().await;
                let invocation = HelperInvocation {
                    algorithm: name,
                    executable: executable.as_path(),
                    args: args.as_slice(),
                    size_hint: None,
                    source: None,
                    chunk_size: self.config.process_chunk_size,
                    progress_step: self.config.progress_step,
                    terminate_grace: self.config.terminate_grace(),
                    deadline: Some(self.config.text_timeout()),
                };
                // Text hashing runs to completion regardless of the engine flag
                let never = CancelToken::new();
                let mut ignore = |_: u8| {};
                match process::run_helper(invocation, data, &never, &self.child_slot, &mut ignore)
                    .await?
                {
                    Outcome::Completed(digest) => Ok(digest),
                    Outcome::Cancelled => Err(ToolError::failed(name, "cancelled").into()),
                }
            }
        }
    }

    fn resolve_all<S: AsRef<str>>(&self, algorithms: &[S]) -> Result<Vec<&AlgorithmDescriptor>> {
        dedupe(algorithms)
            .into_iter()
            .map(|name| self.registry.resolve(name))
            .collect()
    }

    /// One read pass feeding every accumulator
    async fn in_process_pass(
        &self,
        mut file: tokio::fs::File,
        file_size: u64,
        accumulators: Vec<(&str, Accumulator)>,
        mut on_progress: impl FnMut(u8),
    ) -> Result<Outcome<(ResultMap, u64)>> {
        let mut accumulators = accumulators;
        let mut state = ProgressState::new(file_size, self.config.progress_step);
        let mut buffer = vec![0u8; self.config.chunk_size];

        loop {
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }

            let read = process::fill_buffer(&mut file, &mut buffer).await?;
            if read == 0 {
                break;
            }

            let chunk = &buffer[..read];
            for (_, accumulator) in accumulators.iter_mut() {
                accumulator.update(chunk);
            }

            if let Some(percent) = state.advance(read as u64) {
                on_progress(percent);
            }
        }

        if let Some(percent) = state.finish() {
            on_progress(percent);
        }

        let mut digests = ResultMap::new();
        for (name, accumulator) in accumulators {
            digests.insert_digest(name, accumulator.finalize());
        }
        Ok(Outcome::Completed((digests, state.bytes_processed())))
    }
}

/// Emits `ProgressUpdate::Hash` with the overall percentage weighted by pass
struct PassTracker<'a> {
    progress: &'a dyn ProgressProvider,
    path: &'a Path,
    total_passes: u32,
}

impl PassTracker<'_> {
    fn report(&self, pass: &str, percent: u8, passes_done: u32) {
        self.progress.report(ProgressUpdate::Hash {
            path: self.path.to_path_buf(),
            pass: pass.to_string(),
            percent,
            overall: overall_percent(passes_done, percent, self.total_passes),
        });
    }
}

fn overall_percent(passes_done: u32, percent: u8, total_passes: u32) -> u8 {
    if total_passes == 0 {
        return 100;
    }
    let done = u64::from(passes_done) * 100 + u64::from(percent.min(100));
    (done / u64::from(total_passes)).min(100) as u8
}

/// Requested names in first-seen order without repeats
fn dedupe<S: AsRef<str>>(algorithms: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    algorithms
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Open a regular file and return it with its size
async fn open_file(path: &Path) -> Result<(tokio::fs::File, u64)> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| IoError::from_std(e).with_path(path))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|e| IoError::from_std(e).with_path(path))?;
    if !metadata.is_file() {
        return Err(IoError::not_a_file(path).into());
    }
    Ok((file, metadata.len()))
}

fn with_source_path(error: Error, path: &Path) -> Error {
    match error {
        Error::Io(io) if io.path.is_none() => Error::Io(io.with_path(path)),
        other => other,
    }
}

/// Counts the bytes handed to a helper
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for CountingReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            self.count += (buf.filled().len() - before) as u64;
        }
        poll
    }
}

impl std::fmt::Debug for HashEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashEngine")
            .field("algorithms", &self.registry.names())
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
