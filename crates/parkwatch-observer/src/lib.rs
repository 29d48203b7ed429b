//! Observer API server for Parkwatch.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Sensor endpoint** (`POST /api/update-parking`) feeding the
//!   validated update pipeline
//! - **Read endpoints** for the current presented view and recent
//!   history
//! - **`WebSocket` endpoint** (`/ws/parking`) pushing a presented view to
//!   every viewer on each accepted update
//! - **Live HTML dashboard** (`GET /`)
//!
//! # Architecture
//!
//! All live state sits behind [`ParkingService`] in [`AppState`]. REST
//! reads compute a fresh presented view on each request; `WebSocket`
//! clients are broadcaster subscribers and receive the same views the
//! update endpoint returns.
//!
//! [`ParkingService`]: parkwatch_core::ParkingService

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{serve, shutdown_signal, start_server, ServerConfig, ServerError};
pub use state::{AppState, HistoryReader};
