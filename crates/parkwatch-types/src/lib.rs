//! Shared type definitions for the Parkwatch occupancy service.
//!
//! Types defined here flow to `TypeScript` via `ts-rs` for the live
//! dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers
//! - [`occupancy`] -- Occupancy state, presented view, raw update payload
//! - [`history`] -- History records and query windows

pub mod history;
pub mod ids;
pub mod occupancy;

pub use history::{HistoryPeriod, HistoryRecord};
pub use ids::SubscriberId;
pub use occupancy::{
    OccupancyCounts, OccupancyState, OccupancyUpdate, ParkingStatus, PresentedView,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::SubscriberId::export_all();
        let _ = crate::occupancy::OccupancyState::export_all();
        let _ = crate::occupancy::ParkingStatus::export_all();
        let _ = crate::occupancy::PresentedView::export_all();
        let _ = crate::history::HistoryRecord::export_all();
        let _ = crate::history::HistoryPeriod::export_all();
    }
}
