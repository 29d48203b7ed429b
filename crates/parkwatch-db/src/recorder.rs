//! Fire-and-forget history recording backed by `PostgreSQL`.
//!
//! The update path calls [`PostgresHistoryRecorder::record`], which only
//! pushes onto a bounded channel. A background task drains the channel
//! and inserts each record. A full queue, a stopped writer or a failed
//! insert are all logged and dropped; nothing is retried and nothing
//! reaches the caller.

use parkwatch_core::HistoryRecorder;
use parkwatch_types::HistoryRecord;
use sqlx::PgPool;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::history_store::HistoryStore;

/// Channel handle to the background history writer.
#[derive(Debug, Clone)]
pub struct PostgresHistoryRecorder {
    tx: mpsc::Sender<HistoryRecord>,
}

impl PostgresHistoryRecorder {
    /// Spawn the writer task on the current Tokio runtime.
    ///
    /// The task exits once every recorder clone has been dropped and the
    /// queue is drained. `queue_capacity` is clamped to at least one.
    pub fn spawn(pool: PgPool, queue_capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let handle = tokio::spawn(run_writer(pool, rx));
        tracing::info!(queue_capacity, "History writer started");
        (Self { tx }, handle)
    }
}

impl HistoryRecorder for PostgresHistoryRecorder {
    fn record(&self, record: HistoryRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    timestamp = %dropped.timestamp,
                    "History queue full, dropping parking record"
                );
            }
            Err(TrySendError::Closed(dropped)) => {
                tracing::warn!(
                    timestamp = %dropped.timestamp,
                    "History writer stopped, dropping parking record"
                );
            }
        }
    }
}

async fn run_writer(pool: PgPool, mut rx: mpsc::Receiver<HistoryRecord>) {
    let store = HistoryStore::new(&pool);
    while let Some(record) = rx.recv().await {
        if let Err(e) = store.insert(&record).await {
            tracing::error!(
                error = %e,
                total = record.total,
                occupied = record.occupied,
                "Failed to persist parking record"
            );
        }
    }
    tracing::debug!("History writer stopped");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record(occupied: u32) -> HistoryRecord {
        HistoryRecord {
            timestamp: Utc::now(),
            total: 10,
            occupied,
            available: 10_u32.saturating_sub(occupied),
        }
    }

    #[test]
    fn record_enqueues_for_writer() {
        let (tx, mut rx) = mpsc::channel(4);
        let recorder = PostgresHistoryRecorder { tx };
        recorder.record(record(3));
        assert_eq!(rx.try_recv().ok().map(|r| r.occupied), Some(3));
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let recorder = PostgresHistoryRecorder { tx };
        recorder.record(record(1));
        recorder.record(record(2));
        assert_eq!(rx.try_recv().ok().map(|r| r.occupied), Some(1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stopped_writer_is_absorbed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let recorder = PostgresHistoryRecorder { tx };
        recorder.record(record(5));
    }
}
