//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(Arc<Container>, Signal) -> Fut`. The closure
//! is only invoked when the worker starts, so shape errors surface at compile
//! time and the body still runs inside the worker's panic boundary.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use bootvisor::{Container, Signal, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("worker", |app: Arc<Container>, signal: Signal| async move {
//!     let greeting = app.get_string("greeting")?;
//!     while !signal.is_stop_requested() {
//!         let _ = &greeting;
//!         signal.stopped().await;
//!     }
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(t.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use crate::container::Container;
use crate::error::TaskError;
use crate::tasks::Signal;
use crate::tasks::task::{BoxTaskFuture, Task};

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(Arc<Container>, Signal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, app: Arc<Container>, signal: Signal) -> BoxTaskFuture {
        Box::pin((self.f)(app, signal))
    }
}
