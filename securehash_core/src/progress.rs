//! Progress reporting abstractions
//!
//! The engine reports progress through the [`ProgressProvider`] trait so the
//! core library stays independent of any rendering or channel choice.
//! [`ProgressState`] implements the "report every 5%" throttle used by the
//! in-process read pass.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::error::TrySendError;

/// Core trait for progress reporting
pub trait ProgressProvider: Send + Sync {
    /// Report a progress update
    fn report(&self, update: ProgressUpdate);

    /// Signal that no further updates will follow
    fn complete(&self) {}
}

/// Unified progress update type
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// Progress of one pass over a file
    ///
    /// `percent` belongs to the pass named by `pass`; `overall` weights every
    /// pass equally since each one consumes the whole file.
    Hash {
        path: PathBuf,
        pass: String,
        percent: u8,
        overall: u8,
    },

    /// Batch operation progress
    Batch {
        current: usize,
        total: usize,
        current_file: Option<PathBuf>,
    },

    /// Generic status message
    Status { message: String },
}

impl ProgressUpdate {
    /// Updates a lossy sink must still deliver: pass completion, batch
    /// position and status lines
    pub fn is_milestone(&self) -> bool {
        match self {
            ProgressUpdate::Hash {
                percent, overall, ..
            } => *percent >= 100 || *overall >= 100,
            ProgressUpdate::Batch { .. } | ProgressUpdate::Status { .. } => true,
        }
    }
}

/// Null implementation for when no progress is needed
pub struct NullProvider;

impl ProgressProvider for NullProvider {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Arc-wrapped provider for sharing across tasks
#[derive(Clone)]
pub struct SharedProvider {
    inner: Arc<dyn ProgressProvider>,
}

impl SharedProvider {
    pub fn new(provider: Arc<dyn ProgressProvider>) -> Self {
        Self { inner: provider }
    }
}

impl ProgressProvider for SharedProvider {
    fn report(&self, update: ProgressUpdate) {
        self.inner.report(update);
    }

    fn complete(&self) {
        self.inner.complete();
    }
}

/// Adapter calling a closure for every update
pub struct CallbackProvider<F> {
    callback: F,
}

impl<F> CallbackProvider<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressProvider for CallbackProvider<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Adapter forwarding updates into a tokio channel
///
/// Sending never blocks. When the channel is full, intermediate percentages
/// are dropped while milestones are held back and delivered in order on the
/// next report, or by a background send once [`ProgressProvider::complete`]
/// is called.
pub struct ChannelAdapter {
    state: Mutex<ChannelState>,
}

struct ChannelState {
    tx: Option<tokio::sync::mpsc::Sender<ProgressUpdate>>,
    pending: VecDeque<ProgressUpdate>,
}

impl ChannelState {
    /// Push held-back milestones; returns false while the channel is still full
    fn flush(&mut self) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            self.pending.clear();
            return false;
        };
        while let Some(update) = self.pending.pop_front() {
            match tx.try_send(update) {
                Ok(()) => {}
                Err(TrySendError::Full(update)) => {
                    self.pending.push_front(update);
                    return false;
                }
                Err(TrySendError::Closed(_)) => {
                    self.tx = None;
                    self.pending.clear();
                    return false;
                }
            }
        }
        true
    }
}

impl ChannelAdapter {
    pub fn new(tx: tokio::sync::mpsc::Sender<ProgressUpdate>) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                tx: Some(tx),
                pending: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChannelState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ProgressProvider for ChannelAdapter {
    fn report(&self, update: ProgressUpdate) {
        let mut state = self.lock();
        if !state.flush() {
            if state.tx.is_some() && update.is_milestone() {
                state.pending.push_back(update);
            }
            return;
        }

        let Some(tx) = state.tx.as_ref() else {
            return;
        };
        match tx.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(update)) => {
                if update.is_milestone() {
                    state.pending.push_back(update);
                }
            }
            Err(TrySendError::Closed(_)) => state.tx = None,
        }
    }

    fn complete(&self) {
        let (tx, pending) = {
            let mut state = self.lock();
            state.flush();
            (state.tx.take(), std::mem::take(&mut state.pending))
        };

        // Dropping the sender lets the receiver observe channel closure
        let Some(tx) = tx else {
            return;
        };
        if pending.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    for update in pending {
                        if tx.send(update).await.is_err() {
                            break;
                        }
                    }
                });
            }
            Err(_) => log::debug!(
                "Dropping {} progress updates: no runtime to deliver them",
                pending.len()
            ),
        }
    }
}

/// Byte-based progress of a single read pass
///
/// `bytes_processed` only grows. A percentage is released for reporting when
/// it has advanced by at least `step` points since the last released value.
#[derive(Debug, Clone)]
pub struct ProgressState {
    bytes_processed: u64,
    total_bytes: u64,
    last_reported_percent: u8,
    step: u8,
}

impl ProgressState {
    pub fn new(total_bytes: u64, step: u8) -> Self {
        Self {
            bytes_processed: 0,
            total_bytes,
            last_reported_percent: 0,
            step: step.max(1),
        }
    }

    /// Account for `bytes` more input; returns a percentage to report, if due
    pub fn advance(&mut self, bytes: u64) -> Option<u8> {
        self.bytes_processed = self.bytes_processed.saturating_add(bytes);
        let percent = self.percent();
        if percent >= self.last_reported_percent.saturating_add(self.step) {
            self.last_reported_percent = percent;
            Some(percent)
        } else {
            None
        }
    }

    /// Returns 100 if the pass completed without reporting it yet
    pub fn finish(&mut self) -> Option<u8> {
        if self.last_reported_percent < 100 {
            self.last_reported_percent = 100;
            Some(100)
        } else {
            None
        }
    }

    /// `floor(bytes_processed * 100 / total_bytes)`, capped at 100
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 0;
        }
        let percent = u128::from(self.bytes_processed) * 100 / u128::from(self.total_bytes);
        percent.min(100) as u8
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn last_reported_percent(&self) -> u8 {
        self.last_reported_percent
    }
}

/// Filter for percentages arriving from a helper's side channel
///
/// Values are clamped to 100. The first value always passes; after that a
/// value is released only once it is at least `step` points above the last
/// released one, except 100 which passes whenever it has not been seen.
#[derive(Debug, Clone)]
pub struct MonotonicPercent {
    last: Option<u8>,
    step: u8,
}

impl Default for MonotonicPercent {
    fn default() -> Self {
        Self::with_step(1)
    }
}

impl MonotonicPercent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(step: u8) -> Self {
        Self {
            last: None,
            step: step.max(1),
        }
    }

    pub fn observe(&mut self, percent: u8) -> Option<u8> {
        let percent = percent.min(100);
        let due = match self.last {
            None => true,
            Some(last) if percent <= last => false,
            Some(_) if percent == 100 => true,
            Some(last) => percent >= last.saturating_add(self.step),
        };
        if due {
            self.last = Some(percent);
            Some(percent)
        } else {
            None
        }
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_state_reports_in_steps() {
        let mut state = ProgressState::new(1000, 5);
        let mut reported = Vec::new();
        for _ in 0..100 {
            if let Some(p) = state.advance(10) {
                reported.push(p);
            }
        }
        assert_eq!(reported.first(), Some(&5));
        assert_eq!(reported.last(), Some(&100));
        assert!(reported.windows(2).all(|w| w[1] >= w[0] + 5));
        assert_eq!(state.finish(), None);
        assert_eq!(state.bytes_processed(), 1000);
    }

    #[test]
    fn test_progress_state_large_chunks_skip_ahead() {
        let mut state = ProgressState::new(100, 5);
        assert_eq!(state.advance(3), None);
        assert_eq!(state.advance(40), Some(43));
        assert_eq!(state.advance(4), None);
        assert_eq!(state.advance(53), Some(100));
    }

    #[test]
    fn test_progress_state_empty_input() {
        let mut state = ProgressState::new(0, 5);
        assert_eq!(state.percent(), 0);
        assert_eq!(state.finish(), Some(100));
        assert_eq!(state.finish(), None);
    }

    #[test]
    fn test_progress_state_caps_at_hundred() {
        let mut state = ProgressState::new(10, 5);
        assert_eq!(state.advance(25), Some(100));
    }

    #[test]
    fn test_monotonic_percent() {
        let mut gate = MonotonicPercent::new();
        assert_eq!(gate.observe(10), Some(10));
        assert_eq!(gate.observe(10), None);
        assert_eq!(gate.observe(7), None);
        assert_eq!(gate.observe(250), Some(100));
        assert_eq!(gate.last(), Some(100));
    }

    #[test]
    fn test_monotonic_percent_with_step() {
        let mut gate = MonotonicPercent::with_step(5);
        let released: Vec<u8> = (1..=20).chain([100]).filter_map(|p| gate.observe(p)).collect();
        assert_eq!(released, vec![1, 6, 11, 16, 100]);
        assert_eq!(gate.observe(100), None);
    }

    #[tokio::test]
    async fn test_channel_adapter_forwards_and_closes() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let adapter = ChannelAdapter::new(tx);

        adapter.report(ProgressUpdate::Status {
            message: "hello".to_string(),
        });
        adapter.complete();
        adapter.report(ProgressUpdate::Status {
            message: "dropped".to_string(),
        });

        assert_eq!(
            rx.recv().await,
            Some(ProgressUpdate::Status {
                message: "hello".to_string()
            })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_channel_adapter_keeps_milestones_when_full() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        let adapter = ChannelAdapter::new(tx);
        let hash = |percent: u8| ProgressUpdate::Hash {
            path: PathBuf::from("a.bin"),
            pass: "SHA-256".to_string(),
            percent,
            overall: percent,
        };

        adapter.report(ProgressUpdate::Status {
            message: "start".to_string(),
        });
        adapter.report(hash(40));
        adapter.report(hash(100));
        adapter.report(ProgressUpdate::Batch {
            current: 2,
            total: 2,
            current_file: None,
        });
        adapter.complete();

        let mut received = Vec::new();
        while let Some(update) = rx.recv().await {
            received.push(update);
        }
        assert_eq!(received.len(), 3, "{received:?}");
        assert!(matches!(received[0], ProgressUpdate::Status { .. }));
        assert_eq!(received[1], hash(100));
        assert!(matches!(received[2], ProgressUpdate::Batch { current: 2, .. }));
    }

    #[test]
    fn test_milestones() {
        let hash = |percent: u8, overall: u8| ProgressUpdate::Hash {
            path: PathBuf::from("a.bin"),
            pass: "MD5".to_string(),
            percent,
            overall,
        };
        assert!(!hash(50, 25).is_milestone());
        assert!(hash(100, 50).is_milestone());
        assert!(
            ProgressUpdate::Status {
                message: String::new()
            }
            .is_milestone()
        );
    }

    #[test]
    fn test_callback_provider() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let provider = CallbackProvider::new(move |update| sink.lock().unwrap().push(update));

        provider.report(ProgressUpdate::Batch {
            current: 1,
            total: 2,
            current_file: None,
        });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
