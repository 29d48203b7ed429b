//! Derivation of display fields from the raw occupancy state.
//!
//! Everything here is pure. The presented view is recomputed on every
//! read so that `status` and `updatedAgo` never go stale.

use chrono::{DateTime, TimeDelta, Utc};
use parkwatch_types::{OccupancyState, ParkingStatus, PresentedView};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Build the presented view of `state` as seen at `now`.
pub fn present(state: &OccupancyState, now: DateTime<Utc>) -> PresentedView {
    PresentedView {
        total: state.total(),
        occupied: state.occupied(),
        available: state.available(),
        last_updated: state.last_updated(),
        status: status(state.available()),
        occupancy_rate: occupancy_rate(state.occupied(), state.total()),
        updated_ago: updated_ago(now.signed_duration_since(state.last_updated())),
    }
}

/// Build the presented view of `state` as seen right now.
pub fn present_now(state: &OccupancyState) -> PresentedView {
    present(state, Utc::now())
}

/// `Available` while any spot is free.
pub const fn status(available: u32) -> ParkingStatus {
    if available > 0 {
        ParkingStatus::Available
    } else {
        ParkingStatus::Full
    }
}

/// `occupied / total * 100` with one decimal place and a `%` suffix.
///
/// An empty-capacity facility reports `"0.0%"`. Computed in tenths of a
/// percent with half-up rounding.
pub fn occupancy_rate(occupied: u32, total: u32) -> String {
    let total = u64::from(total);
    let tenths = u64::from(occupied)
        .saturating_mul(2000)
        .saturating_add(total)
        .checked_div(total.saturating_mul(2))
        .unwrap_or(0);
    format!("{}.{}%", tenths / 10, tenths % 10)
}

/// Coarse human-relative rendering of an elapsed duration.
///
/// Under a minute (or negative, on clock skew) is `"just now"`; then whole
/// minutes, hours, and days.
pub fn updated_ago(elapsed: TimeDelta) -> String {
    let seconds = elapsed.num_seconds();
    if seconds < SECONDS_PER_MINUTE {
        String::from("just now")
    } else if seconds < SECONDS_PER_HOUR {
        plural(seconds / SECONDS_PER_MINUTE, "minute")
    } else if seconds < SECONDS_PER_DAY {
        plural(seconds / SECONDS_PER_HOUR, "hour")
    } else {
        plural(seconds / SECONDS_PER_DAY, "day")
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use parkwatch_types::OccupancyCounts;

    use super::*;

    fn state(total: u32, occupied: u32, at: DateTime<Utc>) -> OccupancyState {
        let counts = OccupancyCounts::new(total, occupied).unwrap_or(OccupancyCounts::empty(0));
        OccupancyState::new(counts, at)
    }

    #[test]
    fn rate_boundaries() {
        assert_eq!(occupancy_rate(0, 10), "0.0%");
        assert_eq!(occupancy_rate(10, 10), "100.0%");
        assert_eq!(occupancy_rate(0, 0), "0.0%");
        assert_eq!(occupancy_rate(4, 10), "40.0%");
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        assert_eq!(occupancy_rate(1, 3), "33.3%");
        assert_eq!(occupancy_rate(2, 3), "66.7%");
        assert_eq!(occupancy_rate(1, 16), "6.3%");
        assert_eq!(occupancy_rate(1, 7), "14.3%");
    }

    #[test]
    fn status_tracks_available() {
        assert_eq!(status(1), ParkingStatus::Available);
        assert_eq!(status(0), ParkingStatus::Full);
    }

    #[test]
    fn updated_ago_thresholds() {
        assert_eq!(updated_ago(TimeDelta::seconds(0)), "just now");
        assert_eq!(updated_ago(TimeDelta::seconds(59)), "just now");
        assert_eq!(updated_ago(TimeDelta::seconds(60)), "1 minute ago");
        assert_eq!(updated_ago(TimeDelta::minutes(59)), "59 minutes ago");
        assert_eq!(updated_ago(TimeDelta::minutes(60)), "1 hour ago");
        assert_eq!(updated_ago(TimeDelta::hours(23)), "23 hours ago");
        assert_eq!(updated_ago(TimeDelta::hours(24)), "1 day ago");
        assert_eq!(updated_ago(TimeDelta::days(9)), "9 days ago");
    }

    #[test]
    fn updated_ago_clock_skew_is_just_now() {
        assert_eq!(updated_ago(TimeDelta::seconds(-30)), "just now");
    }

    #[test]
    fn present_copies_counts_and_derives_labels() {
        let now = Utc::now();
        let view = present(&state(10, 10, now - TimeDelta::minutes(5)), now);
        assert_eq!(view.total, 10);
        assert_eq!(view.occupied, 10);
        assert_eq!(view.available, 0);
        assert_eq!(view.status, ParkingStatus::Full);
        assert_eq!(view.occupancy_rate, "100.0%");
        assert_eq!(view.updated_ago, "5 minutes ago");
    }

    #[test]
    fn present_does_not_mutate_state() {
        let now = Utc::now();
        let snapshot = state(8, 2, now);
        let _ = present(&snapshot, now + TimeDelta::days(2));
        assert_eq!(snapshot, state(8, 2, now));
    }
}
