//! `PostgreSQL` history layer for Parkwatch.
//!
//! Every accepted occupancy update is appended to the `parking_records`
//! table by a background writer, and the history endpoint reads it back.
//!
//! ```text
//! ParkingService::apply_update
//!     |
//!     +-- PostgresHistoryRecorder::record --(mpsc)--> writer task
//!                                                        |
//!                                                        +--> HistoryStore::insert
//! GET /api/parking-history --> HistoryStore::recent
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration and migrations
//! - [`history_store`] -- Inserts and windowed queries
//! - [`recorder`] -- Fire-and-forget [`HistoryRecorder`] implementation
//! - [`error`] -- Shared error types
//!
//! [`HistoryRecorder`]: parkwatch_core::HistoryRecorder

pub mod error;
pub mod history_store;
pub mod postgres;
pub mod recorder;

pub use error::DbError;
pub use history_store::{HistoryRow, HistoryStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use recorder::PostgresHistoryRecorder;
