//! Occupancy state, the presented view derived from it, and the raw
//! update payload accepted from sensors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A `(total, occupied)` pair that satisfies `occupied <= total`.
///
/// This is the only way to obtain counts for an [`OccupancyState`], so the
/// derived `available` figure can never underflow or be supplied by a
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OccupancyCounts {
    total: u32,
    occupied: u32,
}

impl OccupancyCounts {
    /// Build a count pair, returning `None` when `occupied > total`.
    pub const fn new(total: u32, occupied: u32) -> Option<Self> {
        if occupied > total {
            None
        } else {
            Some(Self { total, occupied })
        }
    }

    /// An empty facility of the given capacity.
    pub const fn empty(total: u32) -> Self {
        Self { total, occupied: 0 }
    }

    /// Facility capacity.
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Occupied spots.
    pub const fn occupied(&self) -> u32 {
        self.occupied
    }

    /// Free spots, `total - occupied`.
    pub const fn available(&self) -> u32 {
        self.total.saturating_sub(self.occupied)
    }
}

/// The single authoritative occupancy record.
///
/// Replaced wholesale on every accepted update. `available` is always
/// `total - occupied` as of the same write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct OccupancyState {
    total: u32,
    occupied: u32,
    available: u32,
    #[ts(as = "String")]
    last_updated: DateTime<Utc>,
}

impl OccupancyState {
    /// Build a state from validated counts, stamped at `at`.
    pub const fn new(counts: OccupancyCounts, at: DateTime<Utc>) -> Self {
        Self {
            total: counts.total(),
            occupied: counts.occupied(),
            available: counts.available(),
            last_updated: at,
        }
    }

    /// Facility capacity.
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Occupied spots.
    pub const fn occupied(&self) -> u32 {
        self.occupied
    }

    /// Free spots.
    pub const fn available(&self) -> u32 {
        self.available
    }

    /// When this state was written.
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// Display label for the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ParkingStatus {
    /// At least one spot is free.
    Available,
    /// No free spots.
    Full,
}

impl ParkingStatus {
    /// The label as rendered to viewers.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Full => "Full",
        }
    }
}

impl core::fmt::Display for ParkingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-ready projection of an [`OccupancyState`].
///
/// Computed on every read and never stored, so `status` and `updated_ago`
/// always reflect the moment of the read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PresentedView {
    /// Facility capacity.
    pub total: u32,
    /// Occupied spots.
    pub occupied: u32,
    /// Free spots.
    pub available: u32,
    /// Time of the last accepted update.
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
    /// `Available` when `available > 0`, otherwise `Full`.
    pub status: ParkingStatus,
    /// Occupancy percentage with one decimal place, e.g. `"40.0%"`.
    pub occupancy_rate: String,
    /// Coarse relative age of `last_updated`, e.g. `"3 minutes ago"`.
    pub updated_ago: String,
}

/// Raw occupancy update as posted by a sensor.
///
/// Fields are kept as untyped JSON so the validator can tell a missing
/// field from a non-integer or negative one. `None` means the key was
/// absent; an explicit JSON `null` is kept as `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancyUpdate {
    /// Proposed capacity.
    #[serde(default, deserialize_with = "present_value")]
    pub total: Option<serde_json::Value>,
    /// Proposed occupied count.
    #[serde(default, deserialize_with = "present_value")]
    pub occupied: Option<serde_json::Value>,
}

/// Wrap any value that is present in the payload, `null` included.
fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl OccupancyUpdate {
    /// Convenience constructor for integer payloads.
    pub fn from_counts(total: i64, occupied: i64) -> Self {
        Self {
            total: Some(serde_json::Value::from(total)),
            occupied: Some(serde_json::Value::from(occupied)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_reject_occupied_above_total() {
        assert!(OccupancyCounts::new(10, 11).is_none());
        assert!(OccupancyCounts::new(0, 1).is_none());
    }

    #[test]
    fn state_derives_available() {
        let counts = OccupancyCounts::new(10, 4);
        assert!(counts.is_some());
        let state = OccupancyState::new(counts.unwrap_or(OccupancyCounts::empty(0)), Utc::now());
        assert_eq!(state.total(), 10);
        assert_eq!(state.occupied(), 4);
        assert_eq!(state.available(), 6);
    }

    #[test]
    fn state_serializes_camel_case() {
        let state = OccupancyState::new(OccupancyCounts::empty(10), Utc::now());
        let json = serde_json::to_value(state).unwrap_or_default();
        assert_eq!(json["available"], 10);
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("last_updated").is_none());
    }

    #[test]
    fn null_is_kept_apart_from_absent() {
        let update: OccupancyUpdate =
            serde_json::from_str(r#"{"total": null}"#).unwrap_or_default();
        assert_eq!(update.total, Some(serde_json::Value::Null));
        assert!(update.occupied.is_none());
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&ParkingStatus::Full).unwrap_or_default();
        assert_eq!(json, "\"Full\"");
        assert_eq!(ParkingStatus::Available.to_string(), "Available");
    }
}
