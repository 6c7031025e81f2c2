//! # Run-phase task abstractions.
//!
//! - [`Task`] - trait for cooperatively cancellable workers
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`Signal`] - the worker's stop-request handle

mod signal;
mod task;
mod task_fn;

pub use signal::Signal;
pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
