//! Error types used by the lifecycle runtime, the service container and tasks.
//!
//! - [`ContainerError`]: failures of the lazy service container.
//! - [`TaskError`]: explicit failures returned by run-phase tasks.
//! - [`WorkerError`]: what the supervisor captured for a worker (explicit failure or fault).
//! - [`CallbackError`]: failures of setup/exit phase callbacks.
//! - [`RuntimeError`]: misuse of the orchestrator itself.
//!
//! Every enum provides `as_label` (stable snake_case) for logs and metrics.

use thiserror::Error;

use crate::core::Phase;

/// Boxed error returned by phase callbacks.
///
/// Callbacks typically mix container lookups with their own I/O, so they are
/// free to return any error type; `?` converts it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the service container.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// No factory was ever registered under this key.
    #[error("the service does not exist: {key}")]
    UnknownService {
        /// Requested key.
        key: String,
    },

    /// The key already holds a built instance and cannot be overwritten.
    #[error("cannot overwrite initialized service: {key}")]
    DuplicateService {
        /// Offending key.
        key: String,
    },

    /// The stored instance is not of the requested type.
    #[error("service {key} is {found}, not {expected}")]
    TypeMismatch {
        /// Requested key.
        key: String,
        /// Type the caller asked for.
        expected: &'static str,
        /// Type actually stored.
        found: &'static str,
    },

    /// A factory resolved (directly or transitively) the key it is building.
    #[error("circular dependency while building {key}: {}", .chain.join(" -> "))]
    CircularDependency {
        /// Key whose build re-entered itself.
        key: String,
        /// Resolution chain leading back to `key`.
        chain: Vec<String>,
    },

    /// The factory reported its own failure.
    #[error("failed to build service {key}: {reason}")]
    Build {
        /// Key being built.
        key: String,
        /// Factory-provided reason.
        reason: String,
    },
}

impl ContainerError {
    /// Shorthand for factories that need to report a build failure.
    pub fn build(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ContainerError::Build {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use bootvisor::ContainerError;
    ///
    /// let err = ContainerError::UnknownService { key: "db".into() };
    /// assert_eq!(err.as_label(), "container_unknown_service");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ContainerError::UnknownService { .. } => "container_unknown_service",
            ContainerError::DuplicateService { .. } => "container_duplicate_service",
            ContainerError::TypeMismatch { .. } => "container_type_mismatch",
            ContainerError::CircularDependency { .. } => "container_circular_dependency",
            ContainerError::Build { .. } => "container_build_failed",
        }
    }
}

/// # Errors returned explicitly by a run-phase task.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task finished with a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task could not obtain a service it depends on.
    #[error(transparent)]
    Service(#[from] ContainerError),
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Service(_) => "task_service_unavailable",
        }
    }
}

/// # Error captured by the supervisor for a single worker.
///
/// This is the "captured error" slot of a worker: it is only observable once
/// the worker has completed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker panicked; the panic was intercepted at the worker boundary.
    #[error("panic recovered, message={message}")]
    Fault {
        /// Panic payload rendered as text.
        message: String,
        /// Stack captured at the panic site (empty when capture is disabled).
        backtrace: String,
    },

    /// The worker returned an explicit failure.
    #[error(transparent)]
    Failed(#[from] TaskError),

    /// The runtime cancelled the worker's task before it could report.
    #[error("worker aborted by the runtime")]
    Aborted,
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use bootvisor::{TaskError, WorkerError};
    ///
    /// let err = WorkerError::from(TaskError::fail("boom"));
    /// assert_eq!(err.as_label(), "worker_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Fault { .. } => "worker_fault",
            WorkerError::Failed(_) => "worker_failed",
            WorkerError::Aborted => "worker_aborted",
        }
    }

    /// True if the worker panicked.
    pub fn is_fault(&self) -> bool {
        matches!(self, WorkerError::Fault { .. })
    }
}

/// # Failure of a single setup or exit callback.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CallbackError {
    /// The callback returned an error.
    #[error("callback failed: {0}")]
    Failed(#[source] BoxError),

    /// The callback panicked.
    #[error("callback panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl CallbackError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Failed(_) => "callback_failed",
            CallbackError::Panicked { .. } => "callback_panicked",
        }
    }
}

/// # Errors produced by the orchestrator itself.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The container was already driven by a lifecycle.
    #[error("lifecycle already started: container is in phase {phase}")]
    AlreadyStarted {
        /// Phase the container was found in.
        phase: Phase,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted { .. } => "runtime_already_started",
        }
    }
}
