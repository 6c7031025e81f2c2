//! # bootvisor
//!
//! **bootvisor** normalizes how a long-running process boots. A fixed
//! sequence of phases prepares a lazily-built service container, then the
//! run phase launches independent long-lived workers and supervises them
//! until one finishes, errors, or the whole group is asked to stop.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   on_init / on_register / on_config / on_prepare        on_run(TaskRef) ...      on_exit
//!            │  (ordered callbacks)                             │                     │
//!            ▼                                                  ▼                     ▼
//! ┌───────────────────────────────────────────────────────────────────────────────────────┐
//! │  Lifecycle (orchestrator)                                                             │
//! │  - drives Init → Register → Config → Prepare → Run → Exit → Terminated                │
//! │  - Bus (broadcast events) ──► SubscriberSet (LogWriter, custom subscribers)           │
//! │  - Supervisor (run phase)                                                             │
//! └──────┬──────────────────┬──────────────────┬───────────────────────────────────┬──────┘
//!        ▼                  ▼                  ▼                                   │
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐                             │
//!   │ worker 0 │       │ worker 1 │       │ worker 2 │   each: Arc<Container>      │
//!   │ Signal 0 │       │ Signal 1 │       │ Signal 2 │         + own Signal        │
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘                             │
//!        └──── Completion { index, result } ───┘                                   │
//!                           │ (JoinSet fan-in)                                     │
//!                           ▼                                                      ▼
//!             first completion ──► stop request to every other worker      Container
//!             join all ──► Report { exit_code: 0 | 1, outcomes, ... }    (lazy services,
//!                                                                          current phase)
//! ```
//!
//! ### Run phase
//! ```text
//! spawn workers ──► wait for the first completion ──► request stop from the others
//!                                                   └─► wait for all (no abort, no timeout)
//!                                                   └─► any captured error ⇒ status 1
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types                                   |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Lifecycle**     | Ordered phase callbacks and the run-phase supervisor.        | [`Lifecycle`], [`Phase`], [`Report`]        |
//! | **Container**     | Lazy, build-once service registry shared by every phase.     | [`Container`], [`Service`]                  |
//! | **Tasks**         | Cooperatively cancellable workers.                           | [`Task`], [`TaskFn`], [`TaskRef`], [`Signal`] |
//! | **Events**        | Observe phases, workers and stop requests.                   | [`Event`], [`EventKind`], [`Subscribe`]     |
//! | **Errors**        | Typed errors for container, tasks, workers and callbacks.    | [`ContainerError`], [`WorkerError`]         |
//! | **Configuration** | Callback error policy, signals, backtraces.                  | [`LifecycleConfig`], [`ErrorPolicy`]        |
//! | **Templates**     | `{{ env "NAME" }}` expansion for config files.               | [`template`]                                |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a `tracing`-backed subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use bootvisor::{Container, Lifecycle, LifecycleConfig, Signal, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut lifecycle = Lifecycle::new(LifecycleConfig::default());
//!
//!     lifecycle.on_register(|app| {
//!         app.register("tick", |_| Ok(Duration::from_millis(10)))?;
//!         Ok(())
//!     });
//!
//!     // Runs until another worker completes.
//!     lifecycle.on_run(TaskFn::arc("ticker", |app: Arc<Container>, signal: Signal| async move {
//!         let tick = app.resolve_as::<Duration>("tick")?;
//!         while !signal.is_stop_requested() {
//!             tokio::time::sleep(*tick).await;
//!         }
//!         Ok::<(), TaskError>(())
//!     }));
//!
//!     // Completes immediately, which asks the ticker to stop.
//!     lifecycle.on_run(TaskFn::arc("one-shot", |_app: Arc<Container>, _signal: Signal| async {
//!         Ok::<(), TaskError>(())
//!     }));
//!
//!     let report = lifecycle.run(Container::shared()).await.unwrap();
//!     assert_eq!(report.exit_code(), 0);
//!     assert!(report.outcome("ticker").unwrap().stop_requested);
//! }
//! ```
mod container;
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

pub mod template;

// ---- Public re-exports ----

pub use container::{Container, Service};
pub use crate::core::{
    CallbackFailure, ErrorPolicy, Lifecycle, LifecycleConfig, Phase, Report, StopHandle,
    WorkerOutcome,
};
pub use error::{BoxError, CallbackError, ContainerError, RuntimeError, TaskError, WorkerError};
pub use events::{Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Signal, Task, TaskFn, TaskRef};

// Optional: expose the built-in tracing subscriber.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
