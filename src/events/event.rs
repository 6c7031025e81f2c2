//! # Runtime events emitted by the lifecycle orchestrator and its workers.
//!
//! The [`EventKind`] enum classifies events in two groups:
//! - **Phase events**: transitions of the boot sequence and callback failures
//! - **Worker events**: run-phase worker start, completion, failures and stop requests
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use bootvisor::{Event, EventKind, Phase};
//!
//! let ev = Event::new(EventKind::WorkerFailed)
//!     .with_worker("http", 0)
//!     .with_phase(Phase::Run)
//!     .with_reason("bind: address in use");
//!
//! assert_eq!(ev.kind, EventKind::WorkerFailed);
//! assert_eq!(ev.worker.as_deref(), Some("http"));
//! assert_eq!(ev.reason.as_deref(), Some("bind: address in use"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::Phase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Phase events ===
    /// A phase began.
    ///
    /// Sets: `phase`.
    PhaseStarted,

    /// All callbacks of a phase returned (or the run phase joined every worker).
    ///
    /// Sets: `phase`.
    PhaseCompleted,

    /// A setup or exit callback failed or panicked.
    ///
    /// Sets: `phase`, `index` (position in the phase list), `reason`.
    CallbackFailed,

    /// Setup stopped early because callback errors are propagated.
    ///
    /// Sets: `phase` (where it halted), `reason`.
    SetupHalted,

    // === Worker events ===
    /// A run-phase worker was spawned.
    ///
    /// Sets: `worker`, `index`.
    WorkerStarting,

    /// A worker returned successfully.
    ///
    /// Sets: `worker`, `index`.
    WorkerStopped,

    /// A worker returned an explicit error.
    ///
    /// Sets: `worker`, `index`, `reason`.
    WorkerFailed,

    /// A worker panicked; the fault was captured.
    ///
    /// Sets: `worker`, `index`, `reason` (panic message).
    WorkerPanicked,

    /// The supervisor asked a worker to stop.
    ///
    /// Sets: `worker`, `index`, `reason` (what triggered the request).
    StopRequested,

    /// Every worker has completed.
    AllWorkersStopped,

    /// Group stop requested from outside (OS signal or [`StopHandle`](crate::StopHandle)).
    ///
    /// Sets: `reason`.
    ShutdownRequested,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Lifecycle phase the event belongs to.
    pub phase: Option<Phase>,
    /// Worker name, if applicable.
    pub worker: Option<Arc<str>>,
    /// Worker index in the run list, or callback index in its phase list.
    pub index: Option<u32>,
    /// Human-readable reason (errors, panic messages, trigger).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            phase: None,
            worker: None,
            index: None,
            reason: None,
        }
    }

    /// Attaches a phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a worker name and its index in the run list.
    #[inline]
    pub fn with_worker(mut self, name: impl Into<Arc<str>>, index: usize) -> Self {
        self.worker = Some(name.into());
        self.index = Some(clamp_index(index));
        self
    }

    /// Attaches an index without a worker name (callback position).
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(clamp_index(index));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for events describing a worker failure (error or panic).
    #[inline]
    pub fn is_worker_failure(&self) -> bool {
        matches!(self.kind, EventKind::WorkerFailed | EventKind::WorkerPanicked)
    }
}

#[inline]
fn clamp_index(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::PhaseStarted);
        let b = Event::new(EventKind::PhaseCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn worker_builder_sets_name_and_index() {
        let ev = Event::new(EventKind::StopRequested)
            .with_worker("cron", 2)
            .with_reason("worker http completed");
        assert_eq!(ev.worker.as_deref(), Some("cron"));
        assert_eq!(ev.index, Some(2));
        assert!(ev.phase.is_none());
        assert!(!ev.is_worker_failure());
    }

    #[test]
    fn oversized_index_saturates() {
        let ev = Event::new(EventKind::CallbackFailed).with_index(usize::MAX);
        assert_eq!(ev.index, Some(u32::MAX));
    }
}
