//! Progress provider wiring for the CLI
//!
//! The core's [`ChannelAdapter`] already implements the non-blocking
//! channel hop: a slow renderer may miss intermediate percentages but still
//! sees every finished pass and batch step. This module only sizes the
//! channel and decides between a live provider and [`NullProvider`].

use securehash_core::{ChannelAdapter, NullProvider, ProgressProvider, ProgressUpdate};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Updates buffered between the engine and the renderer
const CHANNEL_CAPACITY: usize = 100;

/// Create a progress provider and the receiver its updates arrive on
pub fn create_progress_infrastructure()
-> (Arc<dyn ProgressProvider>, mpsc::Receiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let provider = Arc::new(ChannelAdapter::new(tx)) as Arc<dyn ProgressProvider>;
    (provider, rx)
}

/// Provider plus optional receiver, depending on whether progress is shown
pub fn progress_for(
    show_progress: bool,
) -> (Arc<dyn ProgressProvider>, Option<mpsc::Receiver<ProgressUpdate>>) {
    if show_progress {
        let (provider, rx) = create_progress_infrastructure();
        (provider, Some(rx))
    } else {
        (Arc::new(NullProvider) as Arc<dyn ProgressProvider>, None)
    }
}
