//! # OS signal and stop-handle plumbing.
//!
//! The run phase ends early (cooperatively) when the group is asked to stop,
//! either by a [`StopHandle`] or, with `handle_signals`, by a termination signal:
//! - Unix: `SIGINT`, `SIGTERM`, `SIGQUIT`
//! - elsewhere: Ctrl-C via [`tokio::signal::ctrl_c`]
//!
//! Signal handlers registered through tokio stay registered for the rest of
//! the process. Once the run phase is over, these signals are only delivered
//! to whoever else listens for them; the default action no longer applies.

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Requests a stop of every run-phase worker of one lifecycle.
///
/// Cloneable; can be used before or during the run phase. Stopping is a
/// request: workers observe it through their [`Signal`](crate::Signal).
#[derive(Clone, Debug)]
pub struct StopHandle {
    group: CancellationToken,
}

impl StopHandle {
    pub(crate) fn new(group: CancellationToken) -> Self {
        Self { group }
    }

    /// Requests a stop of all workers.
    pub fn stop(&self) {
        self.group.cancel();
    }

    /// True once a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.group.is_cancelled()
    }
}

/// Completes when the group must stop; returns what triggered it.
pub(crate) async fn external_stop(group: &CancellationToken, handle_signals: bool) -> &'static str {
    if handle_signals {
        tokio::select! {
            res = wait_for_shutdown_signal() => match res {
                Ok(which) => {
                    group.cancel();
                    return which;
                }
                Err(err) => warn!(error = %err, "signal handlers unavailable"),
            },
            _ = group.cancelled() => return "stop handle",
        }
    }
    group.cancelled().await;
    "stop handle"
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let which = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(which)
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
