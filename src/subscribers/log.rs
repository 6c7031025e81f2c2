//! # Logging subscriber.
//!
//! [`LogWriter`] turns lifecycle events into `tracing` records. It does not
//! install a tracing subscriber; the application decides where records go.
//!
//! ## Output (with the default `fmt` layer)
//! ```text
//! INFO  bootvisor: phase started phase=config
//! WARN  bootvisor: callback failed phase=config index=1 reason="missing DSN"
//! INFO  bootvisor: worker starting worker=http index=0
//! ERROR bootvisor: worker panicked worker=cron index=2 reason="boom"
//! INFO  bootvisor: stop requested worker=http index=0 reason="cron completed"
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// `tracing`-backed logging subscriber.
///
/// Enabled via the `logging` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let phase = e.phase.map(|p| p.as_str()).unwrap_or("-");
        let worker = e.worker.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::PhaseStarted => info!(target: "bootvisor", phase, "phase started"),
            EventKind::PhaseCompleted => info!(target: "bootvisor", phase, "phase completed"),
            EventKind::CallbackFailed => {
                warn!(target: "bootvisor", phase, index = ?e.index, reason, "callback failed")
            }
            EventKind::SetupHalted => error!(target: "bootvisor", phase, reason, "setup halted"),
            EventKind::WorkerStarting => {
                info!(target: "bootvisor", worker, index = ?e.index, "worker starting")
            }
            EventKind::WorkerStopped => {
                info!(target: "bootvisor", worker, index = ?e.index, "worker stopped")
            }
            EventKind::WorkerFailed => {
                error!(target: "bootvisor", worker, index = ?e.index, reason, "worker failed")
            }
            EventKind::WorkerPanicked => {
                error!(target: "bootvisor", worker, index = ?e.index, reason, "worker panicked")
            }
            EventKind::StopRequested => {
                info!(target: "bootvisor", worker, index = ?e.index, reason, "stop requested")
            }
            EventKind::AllWorkersStopped => info!(target: "bootvisor", "all workers stopped"),
            EventKind::ShutdownRequested => {
                warn!(target: "bootvisor", reason, "shutdown requested")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
