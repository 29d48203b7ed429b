//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the [`ParkingService`] (live occupancy, validation,
//! fan-out) and the [`HistoryReader`] serving the history endpoint.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parkwatch_core::{MemoryHistory, ParkingService};
use tokio::sync::watch;
use parkwatch_db::PostgresPool;
use parkwatch_types::HistoryRecord;

use crate::error::ObserverError;

/// Read side of the occupancy history.
#[derive(Debug, Clone)]
pub enum HistoryReader {
    /// Records persisted in `PostgreSQL`.
    Postgres(PostgresPool),
    /// Records kept in process memory.
    Memory(Arc<MemoryHistory>),
}

impl HistoryReader {
    /// Up to `limit` records with `timestamp >= since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::History`] if the database query fails.
    pub async fn recent(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, ObserverError> {
        match self {
            Self::Postgres(pool) => Ok(pool.history().recent(since, limit).await?),
            Self::Memory(history) => Ok(history.recent(since, limit)),
        }
    }

    /// Short backend name for logs and the health endpoint.
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live occupancy, validation and subscriber fan-out.
    pub service: Arc<ParkingService>,
    /// History query backend.
    pub history: HistoryReader,
    /// Flipped to `true` once the server starts shutting down.
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Create application state from its parts.
    pub fn new(service: Arc<ParkingService>, history: HistoryReader) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            service,
            history,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Tell every open `WebSocket` subscription to close. Idempotent.
    ///
    /// Upgraded sockets outlive the HTTP server's graceful shutdown, so
    /// they only release this state once told to stop.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`begin_shutdown`](Self::begin_shutdown) has been
    /// called, immediately if it already was.
    pub async fn shutdown_requested(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|stopping| *stopping).await;
    }

    /// State with in-memory history for a facility of `capacity` spots.
    ///
    /// The same [`MemoryHistory`] records updates and serves queries.
    pub fn in_memory(capacity: u32) -> Self {
        let history = Arc::new(MemoryHistory::default());
        let service = Arc::new(ParkingService::new(capacity, history.clone()));
        Self::new(service, HistoryReader::Memory(history))
    }
}
