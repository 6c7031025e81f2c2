//! # Run-phase supervision.
//!
//! Spawns one worker per run task and supervises the group:
//! ```text
//! tasks[0] tasks[1] ... tasks[N-1]
//!     │        │            │
//!     └──► stop_i = group.child_token()
//!          set.spawn(run_worker(task_i, app, Signal(stop_i), bus))
//!
//! loop until every worker completed:
//!   select! (biased) {
//!     external_stop()  ──► publish ShutdownRequested
//!                          publish StopRequested for every running worker
//!     set.join_next()  ──► record completion
//!                          first one? ──► stop_j.cancel() for every running j
//!                                         publish StopRequested{j}
//!   }
//! publish AllWorkersStopped
//! ```
//!
//! ## Rules
//! - `JoinSet` is the fan-in: every worker yields its own index, so waking
//!   on "whichever finishes first" needs no polling over N channels.
//! - Stop requests are cooperative. No worker is ever aborted; the run phase
//!   ends only when all of them returned.
//! - No short-circuit on errors: every outcome is collected.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::container::Container;
use crate::core::report::WorkerOutcome;
use crate::core::shutdown;
use crate::core::worker::{Completion, run_worker};
use crate::error::WorkerError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Signal, TaskRef};

/// Supervisor-side half of a worker's signal channel.
struct WorkerSlot {
    name: Arc<str>,
    stop: CancellationToken,
    result: Option<Result<(), WorkerError>>,
}

impl WorkerSlot {
    fn is_running(&self) -> bool {
        self.result.is_none()
    }
}

/// Supervises the run phase of one lifecycle.
pub(crate) struct Supervisor<'a> {
    pub(crate) app: &'a Arc<Container>,
    pub(crate) bus: &'a Bus,
    pub(crate) group: &'a CancellationToken,
    pub(crate) handle_signals: bool,
}

impl Supervisor<'_> {
    /// Runs every task to completion and returns their outcomes in list order.
    pub(crate) async fn run(&self, tasks: &[TaskRef]) -> Vec<WorkerOutcome> {
        let mut set = JoinSet::new();
        let mut slots = self.spawn_workers(&mut set, tasks);

        let external = shutdown::external_stop(self.group, self.handle_signals);
        tokio::pin!(external);
        let mut external_seen = false;
        let mut first_seen = false;

        while slots.iter().any(WorkerSlot::is_running) {
            tokio::select! {
                // External stop first: it must be reported even if it woke every worker.
                biased;
                reason = &mut external, if !external_seen => {
                    external_seen = true;
                    self.bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
                    self.request_stop(&slots, None, reason);
                }
                joined = set.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined {
                        Ok(Completion { index, result }) => {
                            debug!(worker = %slots[index].name, index, ok = result.is_ok(), "worker completed");
                            slots[index].result = Some(result);
                            // After an external stop every worker was already asked once.
                            if !first_seen && !external_seen {
                                first_seen = true;
                                let reason = format!("worker {} completed", slots[index].name);
                                self.request_stop(&slots, Some(index), &reason);
                            }
                        }
                        // Workers catch their own panics; this is a runtime-level abort.
                        Err(err) => {
                            warn!(error = %err, "worker task did not report");
                            if !first_seen && !external_seen {
                                first_seen = true;
                                self.request_stop(&slots, None, "worker aborted");
                            }
                        }
                    }
                }
            }
        }

        self.bus.publish(Event::new(EventKind::AllWorkersStopped));
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| WorkerOutcome {
                index,
                name: slot.name.to_string(),
                stop_requested: slot.stop.is_cancelled(),
                error: match slot.result {
                    Some(Ok(())) => None,
                    Some(Err(e)) => Some(e),
                    None => Some(WorkerError::Aborted),
                },
            })
            .collect()
    }

    fn spawn_workers(&self, set: &mut JoinSet<Completion>, tasks: &[TaskRef]) -> Vec<WorkerSlot> {
        let mut slots = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            let name: Arc<str> = Arc::from(task.name());
            let stop = self.group.child_token();
            let signal = Signal::new(Arc::clone(&name), index, stop.clone());

            set.spawn(run_worker(
                Arc::clone(task),
                Arc::clone(self.app),
                signal,
                self.bus.clone(),
            ));
            slots.push(WorkerSlot {
                name,
                stop,
                result: None,
            });
        }
        slots
    }

    /// Cancels the stop token of every running worker except `skip`.
    fn request_stop(&self, slots: &[WorkerSlot], skip: Option<usize>, reason: &str) {
        for (index, slot) in slots.iter().enumerate() {
            if Some(index) == skip || !slot.is_running() {
                continue;
            }
            slot.stop.cancel();
            self.bus.publish(
                Event::new(EventKind::StopRequested)
                    .with_worker(Arc::clone(&slot.name), index)
                    .with_reason(reason),
            );
        }
    }
}
