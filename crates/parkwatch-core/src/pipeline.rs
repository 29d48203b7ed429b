//! The occupancy update pipeline.
//!
//! ```text
//! OccupancyUpdate --> validate --(rejected)--> ValidationError
//!                         |
//!                    (accepted)
//!                         |
//!                         +--> OccupancyStore::set
//!                         +--> HistoryRecorder::record   (fire-and-forget)
//!                         +--> Broadcaster::publish      (fan-out)
//!                         +--> PresentedView to caller
//! ```
//!
//! Accepted updates are serialized by a writer guard held across the store
//! write and the publish, so every subscriber sees views in write order.
//! The same guard is taken when subscribing, so a new subscriber's initial
//! view can never be older than the next view it is published.

use std::sync::{Arc, Mutex, PoisonError};

use parkwatch_types::{HistoryRecord, OccupancyState, OccupancyUpdate, PresentedView};
use tracing::{debug, info};

use crate::broadcast::{Broadcaster, Subscription};
use crate::presenter::present_now;
use crate::recorder::HistoryRecorder;
use crate::store::OccupancyStore;
use crate::validator::{validate, ValidationError};

/// Owner of the occupancy store, the broadcaster and the history
/// recorder. Shared across request handlers as `Arc<ParkingService>`.
pub struct ParkingService {
    store: OccupancyStore,
    broadcaster: Broadcaster,
    recorder: Arc<dyn HistoryRecorder>,
    writer: Mutex<()>,
}

impl ParkingService {
    /// Create a service for an empty facility of `capacity` spots.
    pub fn new(capacity: u32, recorder: Arc<dyn HistoryRecorder>) -> Self {
        Self::with_parts(OccupancyStore::new(capacity), Broadcaster::new(), recorder)
    }

    /// Create a service from explicit parts.
    pub fn with_parts(
        store: OccupancyStore,
        broadcaster: Broadcaster,
        recorder: Arc<dyn HistoryRecorder>,
    ) -> Self {
        Self {
            store,
            broadcaster,
            recorder,
            writer: Mutex::new(()),
        }
    }

    /// Validate and apply an occupancy update.
    ///
    /// On success the store is replaced, the new state is handed to the
    /// history recorder, and the fresh view is published to every
    /// subscriber before being returned.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] that applies. Nothing is
    /// stored, recorded or published in that case.
    pub fn apply_update(&self, update: &OccupancyUpdate) -> Result<PresentedView, ValidationError> {
        let counts = validate(update).inspect_err(|reason| {
            debug!(%reason, ?update, "occupancy update rejected");
        })?;

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let state = self.store.set(counts);
        self.recorder.record(HistoryRecord::from(&state));

        let view = present_now(&state);
        let report = self.broadcaster.publish(&view);

        info!(
            total = state.total(),
            occupied = state.occupied(),
            available = state.available(),
            delivered = report.delivered,
            dropped = report.dropped,
            "occupancy updated"
        );

        Ok(view)
    }

    /// The current presented view, computed now.
    pub fn current_view(&self) -> PresentedView {
        present_now(&self.store.get())
    }

    /// The raw current state.
    pub fn state(&self) -> OccupancyState {
        self.store.get()
    }

    /// Register a subscriber whose first message is the current view.
    pub fn subscribe(&self) -> Subscription {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.broadcaster.subscribe(self.current_view())
    }

    /// Remove a subscriber. Safe to call more than once.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        self.broadcaster.unsubscribe(subscription.id());
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }
}

impl core::fmt::Debug for ParkingService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParkingService")
            .field("store", &self.store)
            .field("broadcaster", &self.broadcaster)
            .finish_non_exhaustive()
    }
}
