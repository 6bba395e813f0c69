//! Progress provider that records everything it receives

use securehash_core::{ProgressProvider, ProgressUpdate};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct RecordingProvider {
    updates: Mutex<Vec<ProgressUpdate>>,
    completed: AtomicBool,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// `(pass, percent)` of every hash update, in arrival order
    pub fn hash_percents(&self) -> Vec<(String, u8)> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter_map(|update| match update {
                ProgressUpdate::Hash { pass, percent, .. } => Some((pass.clone(), *percent)),
                _ => None,
            })
            .collect()
    }

    /// Percentages reported for one pass
    pub fn percents_for(&self, pass: &str) -> Vec<u8> {
        self.hash_percents()
            .into_iter()
            .filter(|(name, _)| name == pass)
            .map(|(_, percent)| percent)
            .collect()
    }

    /// Overall percentages of every hash update
    pub fn overall(&self) -> Vec<u8> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter_map(|update| match update {
                ProgressUpdate::Hash { overall, .. } => Some(*overall),
                _ => None,
            })
            .collect()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

impl ProgressProvider for RecordingProvider {
    fn report(&self, update: ProgressUpdate) {
        self.updates.lock().unwrap().push(update);
    }

    fn complete(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }
}
