//! # Worker envelope.
//!
//! Runs one task as a worker and turns whatever happens into exactly one
//! [`Completion`]:
//! ```text
//! publish WorkerStarting
//!   └─► catch_unwind(task.spawn(app, signal))
//!         ├─ Ok(Ok(()))  ──► publish WorkerStopped   ──► Completion { result: Ok }
//!         ├─ Ok(Err(e))  ──► publish WorkerFailed    ──► Completion { result: Failed(e) }
//!         └─ Err(panic)  ──► publish WorkerPanicked  ──► Completion { result: Fault }
//! ```
//! `spawn` itself is called inside the boundary, so a closure panicking
//! before it returns a future is caught as well.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::container::Container;
use crate::core::fault;
use crate::error::WorkerError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Signal, TaskRef};

/// What a worker reports when it finishes.
#[derive(Debug)]
pub(crate) struct Completion {
    pub(crate) index: usize,
    pub(crate) result: Result<(), WorkerError>,
}

pub(crate) async fn run_worker(
    task: TaskRef,
    app: Arc<Container>,
    signal: Signal,
    bus: Bus,
) -> Completion {
    let index = signal.index();
    let name: Arc<str> = Arc::from(task.name());
    bus.publish(Event::new(EventKind::WorkerStarting).with_worker(Arc::clone(&name), index));

    let body = async move { task.spawn(app, signal).await };
    let result = match AssertUnwindSafe(body).catch_unwind().await {
        Ok(Ok(())) => {
            bus.publish(Event::new(EventKind::WorkerStopped).with_worker(name, index));
            Ok(())
        }
        Ok(Err(e)) => {
            bus.publish(
                Event::new(EventKind::WorkerFailed)
                    .with_worker(name, index)
                    .with_reason(e.to_string()),
            );
            Err(WorkerError::Failed(e))
        }
        Err(payload) => {
            let fault = fault::into_fault(payload);
            let message = match &fault {
                WorkerError::Fault { message, .. } => message.clone(),
                other => other.to_string(),
            };
            bus.publish(
                Event::new(EventKind::WorkerPanicked)
                    .with_worker(name, index)
                    .with_reason(message),
            );
            Err(fault)
        }
    };

    Completion { index, result }
}
