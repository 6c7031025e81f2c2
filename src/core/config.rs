//! # Lifecycle configuration.
//!
//! [`LifecycleConfig`] centralizes the orchestrator's runtime settings. All
//! fields are public; prefer the accessors over repeating sentinel checks.

/// What to do when a setup or exit callback fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log and record the failure, keep running the phase. Status is unaffected.
    #[default]
    Ignore,
    /// Halt setup at the first failing callback, skip the run phase, still run
    /// exit callbacks, and report failure.
    Propagate,
}

/// Global configuration of a [`Lifecycle`](crate::Lifecycle).
///
/// ## Field semantics
/// - `callback_errors`: policy for failing setup/exit callbacks
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `handle_signals`: treat SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere) as a group stop
/// - `capture_backtraces`: install the panic hook that records worker panic sites
#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    /// Policy for callback failures outside the run phase.
    pub callback_errors: ErrorPolicy,

    /// Capacity of the event bus broadcast channel.
    ///
    /// A listener lagging more than `bus_capacity` events skips the oldest ones.
    pub bus_capacity: usize,

    /// Whether OS termination signals request a stop of every worker.
    ///
    /// Workers are never aborted; the run phase still waits for all of them.
    ///
    /// The handlers are installed when the run phase starts and tokio never
    /// uninstalls them. From then on, including during exit callbacks and
    /// after [`Lifecycle::go`](crate::Lifecycle::go) returns, SIGINT/SIGTERM
    /// no longer terminate the process by default: a later Ctrl-C is
    /// swallowed unless the caller listens for it.
    pub handle_signals: bool,

    /// Whether worker faults carry the backtrace of the panic site.
    ///
    /// Enabling this installs a process-wide panic hook (once) that chains
    /// to the previous hook.
    pub capture_backtraces: bool,
}

impl LifecycleConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// True when callback failures halt setup.
    #[inline]
    pub fn propagates_callback_errors(&self) -> bool {
        self.callback_errors == ErrorPolicy::Propagate
    }
}

impl Default for LifecycleConfig {
    /// - `callback_errors = Ignore`
    /// - `bus_capacity = 1024`
    /// - `handle_signals = false`
    /// - `capture_backtraces = true`
    fn default() -> Self {
        Self {
            callback_errors: ErrorPolicy::Ignore,
            bus_capacity: 1024,
            handle_signals: false,
            capture_backtraces: true,
        }
    }
}
