//! Fan-out of presented views to live subscribers.
//!
//! The [`Broadcaster`] keeps a registry of subscriber channels. Each
//! publish snapshots the registry and releases the lock before sending, so
//! connects and disconnects that race with a publish cannot corrupt it.
//! A subscriber whose channel is closed or full is treated as
//! disconnected and dropped; the others still receive the view.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use parkwatch_types::{PresentedView, SubscriberId};
use tokio::sync::mpsc;
use tracing::debug;

/// Default per-subscriber queue depth.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 32;

type Senders = HashMap<SubscriberId, mpsc::Sender<PresentedView>>;
type Registry = Mutex<Senders>;

/// Outcome of a single [`Broadcaster::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that accepted the view.
    pub delivered: usize,
    /// Subscribers dropped because delivery failed.
    pub dropped: usize,
}

/// Registry of live subscribers plus the publish operation.
#[derive(Debug)]
pub struct Broadcaster {
    registry: Arc<Registry>,
    buffer: usize,
}

impl Broadcaster {
    /// Create a broadcaster with the default per-subscriber buffer.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_SUBSCRIBER_BUFFER)
    }

    /// Create a broadcaster whose subscribers each queue up to `buffer`
    /// views (at least one).
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    /// Register a new subscriber and queue `initial` as its first message.
    pub fn subscribe(&self, initial: PresentedView) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        // Fresh channel with capacity >= 1, so this cannot fail.
        let _ = tx.try_send(initial);

        let id = SubscriberId::new();
        lock(&self.registry).insert(id, tx);
        debug!(subscriber = %id, "subscriber registered");

        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Remove a subscriber. Unknown or already-removed ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if lock(&self.registry).remove(&id).is_some() {
            debug!(subscriber = %id, "subscriber removed");
        }
    }

    /// Send `view` to every current subscriber.
    ///
    /// Never fails. Subscribers that cannot take the view are removed and
    /// counted in [`PublishReport::dropped`].
    pub fn publish(&self, view: &PresentedView) -> PublishReport {
        let snapshot: Vec<(SubscriberId, mpsc::Sender<PresentedView>)> = lock(&self.registry)
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut report = PublishReport::default();
        let mut failed = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(view.clone()) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(e) => {
                    debug!(subscriber = %id, error = %e, "delivery failed, dropping subscriber");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut registry = lock(&self.registry);
            for id in &failed {
                registry.remove(id);
            }
            report.dropped = failed.len();
        }

        report
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<PresentedView>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// This subscriber's id.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next view. Returns `None` once the subscriber has been
    /// dropped from the registry and its queue is drained.
    pub async fn recv(&mut self) -> Option<PresentedView> {
        self.rx.recv().await
    }

    /// Take the next queued view without waiting.
    pub fn try_recv(&mut self) -> Option<PresentedView> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).remove(&self.id);
        }
    }
}

/// The registry only holds senders, so a poisoned lock is still usable.
fn lock(registry: &Registry) -> MutexGuard<'_, Senders> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use parkwatch_types::{OccupancyCounts, OccupancyState};

    use super::*;
    use crate::presenter::present;

    fn view(total: u32, occupied: u32) -> PresentedView {
        let counts = OccupancyCounts::new(total, occupied).unwrap_or(OccupancyCounts::empty(0));
        let now = Utc::now();
        present(&OccupancyState::new(counts, now), now)
    }

    #[test]
    fn subscriber_receives_initial_view_first() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe(view(10, 3));
        let first = sub.try_recv();
        assert_eq!(first.map(|v| v.occupied), Some(3));
        assert!(sub.try_recv().is_none());
        assert_eq!(broadcaster.subscriber_count(), 1);
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let broadcaster = Broadcaster::new();
        let mut subs: Vec<_> = (0..3).map(|_| broadcaster.subscribe(view(10, 0))).collect();
        for sub in &mut subs {
            let _ = sub.try_recv();
        }

        let report = broadcaster.publish(&view(10, 7));
        assert_eq!(report, PublishReport { delivered: 3, dropped: 0 });
        for sub in &mut subs {
            assert_eq!(sub.try_recv().map(|v| v.occupied), Some(7));
        }
    }

    #[test]
    fn failed_delivery_drops_only_that_subscriber() {
        let broadcaster = Broadcaster::new();
        let mut alive_a = broadcaster.subscribe(view(10, 0));
        let mut alive_b = broadcaster.subscribe(view(10, 0));
        let mut doomed = broadcaster.subscribe(view(10, 0));

        // Simulate a broken connection: the receiving side is closed but the
        // registry entry remains.
        doomed.rx.close();

        let report = broadcaster.publish(&view(10, 5));
        assert_eq!(report, PublishReport { delivered: 2, dropped: 1 });
        assert_eq!(broadcaster.subscriber_count(), 2);

        let report = broadcaster.publish(&view(10, 6));
        assert_eq!(report, PublishReport { delivered: 2, dropped: 0 });

        for sub in [&mut alive_a, &mut alive_b] {
            let seen: Vec<u32> = std::iter::from_fn(|| sub.try_recv())
                .map(|v| v.occupied)
                .collect();
            assert_eq!(seen, vec![0, 5, 6]);
        }
    }

    #[test]
    fn full_queue_counts_as_disconnect() {
        let broadcaster = Broadcaster::with_buffer(1);
        let _slow = broadcaster.subscribe(view(10, 0));
        let report = broadcaster.publish(&view(10, 1));
        assert_eq!(report, PublishReport { delivered: 0, dropped: 1 });
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let broadcaster = Broadcaster::new();
        let sub = broadcaster.subscribe(view(10, 0));
        let id = sub.id();
        broadcaster.unsubscribe(id);
        broadcaster.unsubscribe(id);
        broadcaster.unsubscribe(SubscriberId::new());
        assert_eq!(broadcaster.subscriber_count(), 0);
        drop(sub);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let broadcaster = Broadcaster::new();
        let sub = broadcaster.subscribe(view(10, 0));
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(sub);
        assert_eq!(broadcaster.subscriber_count(), 0);
        assert_eq!(broadcaster.publish(&view(10, 1)), PublishReport::default());
    }

    #[test]
    fn publish_with_no_subscribers_is_a_no_op() {
        let broadcaster = Broadcaster::new();
        assert_eq!(broadcaster.publish(&view(4, 4)), PublishReport::default());
    }

    #[test]
    fn concurrent_membership_changes_during_publish() {
        let broadcaster = Arc::new(Broadcaster::with_buffer(1024));
        let churn: Vec<_> = (0..4)
            .map(|_| {
                let broadcaster = Arc::clone(&broadcaster);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let sub = broadcaster.subscribe(view(10, 0));
                        broadcaster.unsubscribe(sub.id());
                    }
                })
            })
            .collect();
        let publisher = {
            let broadcaster = Arc::clone(&broadcaster);
            std::thread::spawn(move || {
                for occupied in 0..200 {
                    let _ = broadcaster.publish(&view(200, occupied));
                }
            })
        };
        for handle in churn {
            assert!(handle.join().is_ok());
        }
        assert!(publisher.join().is_ok());
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn recv_ends_after_removal_and_drain() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe(view(10, 2));
        broadcaster.unsubscribe(sub.id());
        assert_eq!(sub.recv().await.map(|v| v.occupied), Some(2));
        assert!(sub.recv().await.is_none());
    }
}
