//! Time-series history of accepted occupancy updates.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::occupancy::OccupancyState;

/// One accepted update, as appended to the history log.
///
/// Records hold the aggregate counter only. They are immutable once
/// written and ordered by `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistoryRecord {
    /// When the update was accepted.
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    /// Facility capacity.
    pub total: u32,
    /// Occupied spots.
    pub occupied: u32,
    /// Free spots.
    pub available: u32,
}

impl From<&OccupancyState> for HistoryRecord {
    fn from(state: &OccupancyState) -> Self {
        Self {
            timestamp: state.last_updated(),
            total: state.total(),
            occupied: state.occupied(),
            available: state.available(),
        }
    }
}

/// Look-back window for history queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum HistoryPeriod {
    /// The last hour.
    #[default]
    Hour,
    /// The last 24 hours.
    Day,
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
}

impl HistoryPeriod {
    /// Parse a query-string value. Matching is case-sensitive; unknown or
    /// absent values fall back to [`HistoryPeriod::Hour`].
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("day") => Self::Day,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            _ => Self::Hour,
        }
    }

    /// Length of the window.
    pub const fn duration(self) -> TimeDelta {
        match self {
            Self::Hour => TimeDelta::hours(1),
            Self::Day => TimeDelta::days(1),
            Self::Week => TimeDelta::days(7),
            Self::Month => TimeDelta::days(30),
        }
    }

    /// Earliest timestamp included in a query issued at `now`.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::OccupancyCounts;

    #[test]
    fn period_parsing_falls_back_to_hour() {
        assert_eq!(HistoryPeriod::from_query(None), HistoryPeriod::Hour);
        assert_eq!(HistoryPeriod::from_query(Some("decade")), HistoryPeriod::Hour);
        assert_eq!(HistoryPeriod::from_query(Some("week")), HistoryPeriod::Week);
        assert_eq!(HistoryPeriod::from_query(Some("Week")), HistoryPeriod::Hour);
        assert_eq!(HistoryPeriod::from_query(Some("DAY")), HistoryPeriod::Hour);
        assert_eq!(HistoryPeriod::from_query(Some("month")), HistoryPeriod::Month);
    }

    #[test]
    fn since_subtracts_window() {
        let now = Utc::now();
        assert_eq!(now - HistoryPeriod::Day.since(now), TimeDelta::hours(24));
        assert_eq!(now - HistoryPeriod::Month.since(now), TimeDelta::days(30));
    }

    #[test]
    fn record_copies_state() {
        let counts = OccupancyCounts::new(12, 5).unwrap_or(OccupancyCounts::empty(0));
        let state = OccupancyState::new(counts, Utc::now());
        let record = HistoryRecord::from(&state);
        assert_eq!(record.available, 7);
        assert_eq!(record.timestamp, state.last_updated());
    }
}
