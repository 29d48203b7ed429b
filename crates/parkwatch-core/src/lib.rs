//! Occupancy aggregation and broadcast pipeline for Parkwatch.
//!
//! This crate owns the single authoritative occupancy record and
//! everything that guards or observes it.
//!
//! # Modules
//!
//! - [`validator`] -- Type and range checks for inbound sensor updates.
//! - [`store`] -- The lock-guarded [`OccupancyStore`].
//! - [`presenter`] -- Display fields derived from the raw state.
//! - [`broadcast`] -- Subscriber registry and fan-out.
//! - [`recorder`] -- [`HistoryRecorder`] seam and in-memory history.
//! - [`pipeline`] -- [`ParkingService`], the update orchestration.
//! - [`config`] -- Configuration loading from `parkwatch-config.yaml`.
//!
//! [`OccupancyStore`]: store::OccupancyStore
//! [`HistoryRecorder`]: recorder::HistoryRecorder
//! [`ParkingService`]: pipeline::ParkingService

pub mod broadcast;
pub mod config;
pub mod pipeline;
pub mod presenter;
pub mod recorder;
pub mod store;
pub mod validator;

pub use broadcast::{Broadcaster, PublishReport, Subscription};
pub use config::{ConfigError, ParkwatchConfig};
pub use pipeline::ParkingService;
pub use recorder::{HistoryRecorder, MemoryHistory};
pub use store::OccupancyStore;
pub use validator::{validate, ValidationError};
