//! # Result of a lifecycle run.

use std::sync::Arc;

use crate::container::Container;
use crate::core::Phase;
use crate::error::{CallbackError, WorkerError};

/// Final state of one run-phase worker.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    /// Position in the run list.
    pub index: usize,
    /// Task name.
    pub name: String,
    /// Captured error, `None` on success.
    pub error: Option<WorkerError>,
    /// Whether a stop was requested from this worker before the run phase ended.
    pub stop_requested: bool,
}

impl WorkerOutcome {
    /// True if the worker completed without error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A setup or exit callback that failed.
#[derive(Debug)]
pub struct CallbackFailure {
    /// Phase the callback belongs to.
    pub phase: Phase,
    /// Position in that phase's callback list.
    pub index: usize,
    /// What went wrong.
    pub error: CallbackError,
}

/// Everything observable about a finished lifecycle.
#[derive(Debug)]
pub struct Report {
    pub(crate) outcomes: Vec<WorkerOutcome>,
    pub(crate) callback_failures: Vec<CallbackFailure>,
    pub(crate) halted_at: Option<Phase>,
    pub(crate) propagate: bool,
    pub(crate) container: Arc<Container>,
}

impl Report {
    /// Process status: `0` on success, `1` if any worker failed (or, when
    /// callback errors are propagated, if any callback failed).
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// True if the run counts as successful.
    pub fn is_success(&self) -> bool {
        let workers_ok = self.outcomes.iter().all(WorkerOutcome::is_success);
        let callbacks_ok = !self.propagate || self.callback_failures.is_empty();
        workers_ok && callbacks_ok
    }

    /// Per-worker outcomes, in run-list order.
    pub fn outcomes(&self) -> &[WorkerOutcome] {
        &self.outcomes
    }

    /// Outcome of the first worker named `name`.
    pub fn outcome(&self, name: &str) -> Option<&WorkerOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Captured worker errors with the worker name.
    pub fn worker_errors(&self) -> impl Iterator<Item = (&str, &WorkerError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| (o.name.as_str(), e)))
    }

    /// Callback failures, in the order they happened.
    pub fn callback_failures(&self) -> &[CallbackFailure] {
        &self.callback_failures
    }

    /// Phase at which setup was halted, if callback errors are propagated.
    pub fn halted_at(&self) -> Option<Phase> {
        self.halted_at
    }

    /// The container the lifecycle ran against.
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }
}
