//! # Event subscribers.
//!
//! Subscribers observe every event the lifecycle publishes on its
//! [`Bus`](crate::events::Bus): phase transitions, callback failures, worker
//! outcomes and stop requests.
//!
//! ```text
//!   Lifecycle / workers ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                ┌──────┴──────┐
//!                                                                ▼             ▼
//!                                                            LogWriter      Custom
//! ```
//!
//! `Lifecycle::run` drains every subscriber queue before returning, so a
//! subscriber has seen all events of a run once `run` completes.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
