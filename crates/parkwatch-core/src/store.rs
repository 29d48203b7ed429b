//! The process-wide occupancy store.
//!
//! Holds the latest accepted [`OccupancyState`] and nothing else. Writes
//! replace the whole tuple under an exclusive lock; reads copy it out
//! under a shared lock, so a reader never sees fields from two different
//! writes.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use parkwatch_types::{OccupancyCounts, OccupancyState};

/// Lock-guarded owner of the current [`OccupancyState`].
#[derive(Debug)]
pub struct OccupancyStore {
    state: RwLock<OccupancyState>,
}

impl OccupancyStore {
    /// Create a store for an empty facility of the given capacity,
    /// stamped with the current time.
    pub fn new(capacity: u32) -> Self {
        Self::with_state(OccupancyState::new(OccupancyCounts::empty(capacity), Utc::now()))
    }

    /// Create a store seeded with an explicit state.
    pub const fn with_state(state: OccupancyState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Return a consistent snapshot of the current state.
    pub fn get(&self) -> OccupancyState {
        // The guarded value is `Copy` and only ever replaced wholesale, so
        // a poisoned lock still holds a coherent state.
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the state with `counts`, stamped with the current time.
    pub fn set(&self, counts: OccupancyCounts) -> OccupancyState {
        self.set_at(counts, Utc::now())
    }

    /// Replace the state with `counts`, stamped with `at`.
    pub fn set_at(&self, counts: OccupancyCounts, at: DateTime<Utc>) -> OccupancyState {
        let next = OccupancyState::new(counts, at);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
        next
    }
}
