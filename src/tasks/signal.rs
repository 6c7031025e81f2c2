//! # Per-worker stop signal.
//!
//! Each run-phase worker owns one [`Signal`]. The supervisor holds the matching
//! stop token and cancels it when another worker completes or when the whole
//! group is asked to stop. Cancellation is cooperative: nothing is aborted, the
//! worker decides when to return.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Stop-request side of a worker's signal channel.
///
/// Clones observe the same request.
#[derive(Clone, Debug)]
pub struct Signal {
    name: Arc<str>,
    index: usize,
    stop: CancellationToken,
}

impl Signal {
    pub(crate) fn new(name: Arc<str>, index: usize, stop: CancellationToken) -> Self {
        Self { name, index, stop }
    }

    /// A signal not attached to any supervisor; useful for driving a task by hand.
    pub fn detached(name: impl Into<Arc<str>>) -> Self {
        Self::new(name.into(), 0, CancellationToken::new())
    }

    /// Name of the worker this signal belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the worker in the run list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once a stop was requested.
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Completes when a stop is requested.
    pub async fn stopped(&self) {
        self.stop.cancelled().await
    }

    /// Requests a stop of this worker only.
    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    /// Underlying token, for `tokio::select!` or child tokens.
    pub fn token(&self) -> &CancellationToken {
        &self.stop
    }
}
