//! Runtime core: phases, orchestration and run-phase supervision.
//!
//! Internal modules:
//! - [`phase`]: the fixed boot sequence;
//! - [`lifecycle`]: callback registration and the phase runner;
//! - [`supervisor`]: spawns workers, broadcasts stop requests, joins them;
//! - [`worker`]: per-worker envelope with panic isolation;
//! - [`fault`]: panic-site backtrace capture;
//! - [`shutdown`]: stop handle and OS signal handling;
//! - [`report`]: outcome of a run.

mod config;
mod fault;
mod lifecycle;
mod phase;
mod report;
mod shutdown;
mod supervisor;
mod worker;

pub(crate) use fault::{panic_message, take_last};

pub use config::{ErrorPolicy, LifecycleConfig};
pub use lifecycle::Lifecycle;
pub use phase::Phase;
pub use report::{CallbackFailure, Report, WorkerOutcome};
pub use shutdown::StopHandle;
