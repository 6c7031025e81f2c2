//! # Run-phase task abstraction.
//!
//! A [`Task`] is one long-lived unit of the run phase. Every spawn receives the
//! shared [`Container`] and the worker's own [`Signal`]; the task should check
//! the signal periodically and wind down once a stop is requested.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::container::Container;
use crate::error::TaskError;
use crate::tasks::Signal;

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cooperatively cancellable run-phase task.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use bootvisor::{BoxTaskFuture, Container, Signal, Task};
///
/// struct Heartbeat;
///
/// impl Task for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     fn spawn(&self, _app: Arc<Container>, signal: Signal) -> BoxTaskFuture {
///         Box::pin(async move {
///             signal.stopped().await;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Creates the future driving this task.
    ///
    /// Called once, inside the worker's panic boundary.
    fn spawn(&self, app: Arc<Container>, signal: Signal) -> BoxTaskFuture;
}
