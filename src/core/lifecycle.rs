//! # Lifecycle: the staged boot sequence.
//!
//! [`Lifecycle`] holds ordered callback lists for every setup phase and for
//! exit, plus the run list of tasks. [`Lifecycle::run`] drives them against a
//! [`Container`]:
//! ```text
//! Init ─► Register ─► Config ─► Prepare      callbacks, in order, on the caller's task
//!                                  │
//!                                  ▼
//!                                 Run         one worker per task, supervised
//!                                  │
//!                                  ▼
//!                                 Exit        callbacks, always executed
//!                                  │
//!                                  ▼
//!                             Terminated      Report { exit_code, outcomes, ... }
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use bootvisor::{Container, Lifecycle, LifecycleConfig, Signal, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut lifecycle = Lifecycle::new(LifecycleConfig::default());
//!
//!     lifecycle.on_register(|app| {
//!         app.register("greeting", |_| Ok(String::from("Salut")))?;
//!         Ok(())
//!     });
//!     lifecycle.on_run(TaskFn::arc("greeter", |app: Arc<Container>, _signal: Signal| async move {
//!         let greeting = app.get_string("greeting")?;
//!         assert_eq!(greeting, "Salut");
//!         Ok::<(), TaskError>(())
//!     }));
//!
//!     let status = lifecycle.go(Container::shared()).await;
//!     assert_eq!(status, 0);
//! }
//! ```

use std::ops::ControlFlow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::container::Container;
use crate::core::fault::{self, panic_message};
use crate::core::report::{CallbackFailure, Report};
use crate::core::shutdown::StopHandle;
use crate::core::supervisor::Supervisor;
use crate::core::{LifecycleConfig, Phase};
use crate::error::{BoxError, CallbackError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::TaskRef;

type Callback = Box<dyn Fn(&Container) -> Result<(), BoxError> + Send + Sync + 'static>;

/// Orchestrates the boot sequence of one process run.
///
/// Registration methods append to ordered lists; [`run`](Lifecycle::run)
/// consumes the lifecycle, so nothing can be added once the run phase starts.
pub struct Lifecycle {
    cfg: LifecycleConfig,
    init: Vec<Callback>,
    register: Vec<Callback>,
    config: Vec<Callback>,
    prepare: Vec<Callback>,
    exit: Vec<Callback>,
    tasks: Vec<TaskRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    group: CancellationToken,
}

impl Lifecycle {
    /// Creates an empty lifecycle.
    pub fn new(cfg: LifecycleConfig) -> Self {
        Self {
            cfg,
            init: Vec::new(),
            register: Vec::new(),
            config: Vec::new(),
            prepare: Vec::new(),
            exit: Vec::new(),
            tasks: Vec::new(),
            subscribers: Vec::new(),
            group: CancellationToken::new(),
        }
    }

    /// Sets event subscribers for observability.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn subscribe(&mut self, subscriber: Arc<dyn Subscribe>) -> &mut Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Adds an `Init` callback: register flags and defaults, no logic.
    pub fn on_init<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Container) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.init.push(Box::new(f));
        self
    }

    /// Adds a `Register` callback: services that need no configuration.
    pub fn on_register<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Container) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register.push(Box::new(f));
        self
    }

    /// Adds a `Config` callback: read configuration.
    pub fn on_config<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Container) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.config.push(Box::new(f));
        self
    }

    /// Adds a `Prepare` callback: define the main services from configuration.
    pub fn on_prepare<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Container) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.prepare.push(Box::new(f));
        self
    }

    /// Adds an `Exit` callback. Exit callbacks run even if setup or workers failed.
    pub fn on_exit<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Container) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.exit.push(Box::new(f));
        self
    }

    /// Adds a run-phase task. Each task becomes one concurrently running worker.
    pub fn on_run(&mut self, task: TaskRef) -> &mut Self {
        self.tasks.push(task);
        self
    }

    /// Number of callbacks registered for `phase` (tasks for [`Phase::Run`]).
    pub fn len(&self, phase: Phase) -> usize {
        match phase {
            Phase::Run => self.tasks.len(),
            Phase::Terminated => 0,
            other => self.callbacks(other).len(),
        }
    }

    /// Handle to request a stop of every worker of this lifecycle.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.group.clone())
    }

    /// Runs the whole boot sequence and returns the process status.
    ///
    /// `0` when every worker succeeded, `1` otherwise.
    ///
    /// Same cancellation caveat as [`Lifecycle::run`].
    pub async fn go(self, app: Arc<Container>) -> i32 {
        match self.run(app).await {
            Ok(report) => report.exit_code(),
            Err(err) => {
                warn!(error = %err, "lifecycle refused to start");
                1
            }
        }
    }

    /// Runs the whole boot sequence and returns the detailed [`Report`].
    ///
    /// Fails only if `app` was already driven by another lifecycle.
    ///
    /// # Cancellation
    /// Not cancel-safe. Dropping the future during the run phase aborts every
    /// worker and skips the exit callbacks; the container is left in `Run`.
    /// Use a [`StopHandle`] to end the run early and drive this to completion.
    pub async fn run(self, app: Arc<Container>) -> Result<Report, RuntimeError> {
        if !app.claim() {
            return Err(RuntimeError::AlreadyStarted { phase: app.phase() });
        }
        if self.cfg.capture_backtraces {
            fault::install_hook();
        }

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = spawn_listener(&bus, SubscriberSet::new(self.subscribers.clone()));

        let mut failures = Vec::new();
        let mut halted_at = None;

        for phase in Phase::SETUP {
            self.enter(phase, &app, &bus);
            if self.run_callbacks(phase, &app, &bus, &mut failures).is_break() {
                halted_at = Some(phase);
                break;
            }
            bus.publish(Event::new(EventKind::PhaseCompleted).with_phase(phase));
        }

        let outcomes = match halted_at {
            Some(phase) => {
                bus.publish(
                    Event::new(EventKind::SetupHalted)
                        .with_phase(phase)
                        .with_reason("callback failed with propagating error policy"),
                );
                Vec::new()
            }
            None => {
                self.enter(Phase::Run, &app, &bus);
                let supervisor = Supervisor {
                    app: &app,
                    bus: &bus,
                    group: &self.group,
                    handle_signals: self.cfg.handle_signals,
                };
                let outcomes = supervisor.run(&self.tasks).await;
                bus.publish(Event::new(EventKind::PhaseCompleted).with_phase(Phase::Run));
                outcomes
            }
        };

        self.enter(Phase::Exit, &app, &bus);
        let _ = self.run_callbacks(Phase::Exit, &app, &bus, &mut failures);
        bus.publish(Event::new(EventKind::PhaseCompleted).with_phase(Phase::Exit));

        app.advance(Phase::Terminated);
        debug!(workers = outcomes.len(), failures = failures.len(), "lifecycle terminated");

        // Closing the bus ends the listener once it drained the buffer.
        drop(bus);
        if let Ok(set) = listener.await {
            set.shutdown().await;
        }

        Ok(Report {
            outcomes,
            callback_failures: failures,
            halted_at,
            propagate: self.cfg.propagates_callback_errors(),
            container: app,
        })
    }

    fn enter(&self, phase: Phase, app: &Container, bus: &Bus) {
        app.advance(phase);
        debug!(%phase, entries = self.len(phase), "entering phase");
        bus.publish(Event::new(EventKind::PhaseStarted).with_phase(phase));
    }

    fn callbacks(&self, phase: Phase) -> &[Callback] {
        match phase {
            Phase::Init => &self.init,
            Phase::Register => &self.register,
            Phase::Config => &self.config,
            Phase::Prepare => &self.prepare,
            Phase::Exit => &self.exit,
            Phase::Run | Phase::Terminated => &[],
        }
    }

    /// Runs the callbacks of `phase` in order.
    ///
    /// Breaks at the first failure when errors propagate, except in `Exit`,
    /// whose callbacks always all run.
    fn run_callbacks(
        &self,
        phase: Phase,
        app: &Container,
        bus: &Bus,
        failures: &mut Vec<CallbackFailure>,
    ) -> ControlFlow<()> {
        let mut flow = ControlFlow::Continue(());
        for (index, callback) in self.callbacks(phase).iter().enumerate() {
            let error = match catch_unwind(AssertUnwindSafe(|| callback(app))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => CallbackError::Failed(err),
                Err(payload) => {
                    fault::take_last();
                    CallbackError::Panicked {
                        message: panic_message(payload.as_ref()),
                    }
                }
            };

            warn!(%phase, index, error = %error, "phase callback failed");
            bus.publish(
                Event::new(EventKind::CallbackFailed)
                    .with_phase(phase)
                    .with_index(index)
                    .with_reason(error.to_string()),
            );
            failures.push(CallbackFailure { phase, index, error });

            if self.cfg.propagates_callback_errors() {
                flow = ControlFlow::Break(());
                if phase != Phase::Exit {
                    break;
                }
            }
        }
        flow
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(LifecycleConfig::default())
    }
}

/// Forwards bus events to the subscriber set until the bus is closed.
fn spawn_listener(bus: &Bus, set: SubscriberSet) -> JoinHandle<SubscriberSet> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event listener lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set
    })
}
