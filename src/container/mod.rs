//! # Lazy service container.
//!
//! A string-keyed registry of factories with at most one memoized value per
//! key. Values are built on first access and shared afterwards:
//! ```text
//! register("db", factory) ──► Slot { factory, instance: empty }
//!
//! resolve("db")
//!   ├─ instance set?      ──► clone handle
//!   ├─ already building   ──► CircularDependency (same thread) / wait (other thread)
//!   └─ factory(&container) ──► memoize ──► clone handle
//! ```
//!
//! The container is shared by every phase callback (`&Container`) and every
//! run-phase worker (`Arc<Container>`).

mod registry;
mod service;

pub use registry::Container;
pub use service::Service;
