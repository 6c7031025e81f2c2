//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Publishing never
//! blocks, so the orchestrator and the worker envelopes can publish from any
//! context, including synchronous phase callbacks.
//!
//! ```text
//! Publishers (many):                    Listener (one):
//!   Lifecycle ──┐
//!   Worker 1  ──┼──────► Bus ───────► event_listener ────► SubscriberSet
//!   Worker N  ──┘  (broadcast chan)    (in Lifecycle::run)
//! ```
//!
//! ## Rules
//! - **Bounded capacity**: a single ring buffer; slow receivers observe `Lagged(n)`.
//! - **No persistence**: events are lost if there are no receivers at send time.
//! - **Closing**: the listener stops once every `Bus` clone is dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; drops it if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
