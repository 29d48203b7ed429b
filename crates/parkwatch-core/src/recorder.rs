//! History recorder seam.
//!
//! The update pipeline hands every accepted state to a [`HistoryRecorder`]
//! and moves on. Recording is best-effort: implementations must not block
//! the caller and must absorb their own failures (log, never propagate).
//! Live-state availability wins over historical completeness.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use parkwatch_types::HistoryRecord;

/// Default number of records kept by [`MemoryHistory`].
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// Sink for accepted occupancy updates.
///
/// Called synchronously from the update path, so implementations should
/// hand the record off (channel, buffer) rather than do I/O inline.
pub trait HistoryRecorder: Send + Sync {
    /// Record one accepted update. Failures are logged by the
    /// implementation and never reach the caller.
    fn record(&self, record: HistoryRecord);
}

/// Bounded in-memory history, newest last.
///
/// Serves as the recorder and the query side when no database is
/// configured. The oldest records are evicted once `capacity` is reached.
#[derive(Debug)]
pub struct MemoryHistory {
    records: Mutex<VecDeque<HistoryRecord>>,
    capacity: usize,
}

impl MemoryHistory {
    /// Create an empty history holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Up to `limit` records with `timestamp >= since`, newest first.
    pub fn recent(&self, since: DateTime<Utc>, limit: usize) -> Vec<HistoryRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .rev()
            .filter(|r| r.timestamp >= since)
            .take(limit)
            .copied()
            .collect()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

impl HistoryRecorder for MemoryHistory {
    fn record(&self, record: HistoryRecord) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }
}
