//! # Subscriber lanes.
//!
//! Every subscriber gets a lane: a bounded queue drained by its own tokio
//! task. Delivering an event only enqueues it, so a slow or panicking
//! subscriber delays neither the lifecycle nor the other subscribers.
//!
//! ```text
//! listener ── emit(&Event) ──┬──► lane "log-writer" ─► on_event()
//!                            ├──► lane "audit"      ─► on_event()
//!                            └──► lane ...          ─► on_event()
//! ```
//!
//! Order is FIFO per lane and unspecified across lanes. A full queue drops
//! the event for that lane only; drops are counted and reported again when
//! the set is shut down.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::core::{panic_message, take_last};
use crate::events::Event;

use super::Subscribe;

/// One subscriber with its queue and draining task.
struct Lane {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    dropped: AtomicU64,
    drain: JoinHandle<()>,
}

impl Lane {
    fn open(sub: Arc<dyn Subscribe>) -> Self {
        let name = sub.name();
        let (queue, rx) = mpsc::channel(sub.queue_capacity().max(1));
        Self {
            name,
            queue,
            dropped: AtomicU64::new(0),
            drain: tokio::spawn(drain(sub, rx)),
        }
    }

    fn offer(&self, ev: &Arc<Event>) {
        let reason = match self.queue.try_send(Arc::clone(ev)) {
            Ok(()) => return,
            Err(TrySendError::Full(_)) => "queue full",
            Err(TrySendError::Closed(_)) => "lane closed",
        };
        self.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(subscriber = self.name, seq = ev.seq, kind = ?ev.kind, reason, "event dropped");
    }

    async fn close(self) {
        drop(self.queue);
        let _ = self.drain.await;
        let dropped = self.dropped.into_inner();
        if dropped > 0 {
            warn!(subscriber = self.name, dropped, "subscriber missed events");
        }
    }
}

async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>) {
    while let Some(ev) = rx.recv().await {
        let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        if let Err(payload) = handled {
            take_last();
            warn!(
                subscriber = sub.name(),
                seq = ev.seq,
                panic = %panic_message(payload.as_ref()),
                "subscriber panicked"
            );
        }
    }
}

/// Fans events out to a fixed group of subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
}

impl SubscriberSet {
    /// Opens one lane per subscriber. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self {
            lanes: subscribers.into_iter().map(Lane::open).collect(),
        }
    }

    /// Enqueues `event` on every lane without waiting.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for lane in &self.lanes {
            lane.offer(&shared);
        }
    }

    /// Closes every lane and waits until the queued events were handled.
    pub async fn shutdown(self) {
        for lane in self.lanes {
            lane.close().await;
        }
    }

    /// Events dropped so far, over all lanes.
    pub fn dropped(&self) -> u64 {
        self.lanes
            .iter()
            .map(|l| l.dropped.load(Ordering::Relaxed))
            .sum()
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<u64>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.seq);
        }
    }

    struct Exploder;

    #[async_trait]
    impl Subscribe for Exploder {
        async fn on_event(&self, _ev: &Event) {
            panic!("subscriber bug");
        }
    }

    /// Never finishes an event, with room for one queued event.
    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _ev: &Event) {
            std::future::pending::<()>().await;
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn panicking_subscriber_does_not_starve_others() {
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Exploder), rec.clone()];
        let set = SubscriberSet::new(subs);
        assert_eq!(set.len(), 2);

        let a = Event::new(EventKind::PhaseStarted);
        let b = Event::new(EventKind::PhaseCompleted);
        set.emit(&a);
        set.emit(&b);
        set.shutdown().await;

        assert_eq!(*rec.0.lock().unwrap(), vec![a.seq, b.seq]);
    }

    #[tokio::test]
    async fn full_lane_drops_and_counts() {
        let set = SubscriberSet::new(vec![Arc::new(Stuck) as Arc<dyn Subscribe>]);
        // The drain task has not run yet: one slot, three offers.
        for _ in 0..3 {
            set.emit(&Event::new(EventKind::AllWorkersStopped));
        }
        assert_eq!(set.dropped(), 2);
    }
}
