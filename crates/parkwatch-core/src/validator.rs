//! Validation gate for inbound occupancy updates.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. both fields present
//! 2. both fields integers
//! 3. both fields non-negative
//! 4. `occupied <= total`
//!
//! Nothing is rounded or clamped. A float with no fractional part
//! (`4.0`) is an integer. An explicit `null` is present but not an
//! integer. A non-negative integer beyond the `u32` capacity range is
//! rejected as not an integer, after the sign check.

use parkwatch_types::{OccupancyCounts, OccupancyUpdate};
use serde_json::Value;

/// Reasons an occupancy update is rejected.
///
/// All variants are caller-fixable. A rejected update never touches the
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// `total` or `occupied` is absent.
    #[error("Missing required fields: total and occupied")]
    MissingFields,

    /// `total` or `occupied` is not an integer in the supported range.
    #[error("Total and occupied must be integers")]
    NotIntegers,

    /// `total` or `occupied` is below zero.
    #[error("Total and occupied must be non-negative")]
    Negative,

    /// `occupied` is larger than `total`.
    #[error("Occupied spots cannot exceed total spots")]
    OccupiedExceedsTotal,
}

/// An integral JSON number, split by sign and range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Integral {
    Negative,
    InRange(u32),
    TooLarge,
}

/// Validate an update and return the accepted counts.
///
/// # Errors
///
/// Returns the first [`ValidationError`] that applies, in the order
/// listed in the module docs.
pub fn validate(update: &OccupancyUpdate) -> Result<OccupancyCounts, ValidationError> {
    let (Some(total), Some(occupied)) = (update.total.as_ref(), update.occupied.as_ref()) else {
        return Err(ValidationError::MissingFields);
    };

    let (Some(total), Some(occupied)) = (integral(total), integral(occupied)) else {
        return Err(ValidationError::NotIntegers);
    };

    match (total, occupied) {
        (Integral::Negative, _) | (_, Integral::Negative) => Err(ValidationError::Negative),
        (Integral::InRange(total), Integral::InRange(occupied)) => {
            OccupancyCounts::new(total, occupied).ok_or(ValidationError::OccupiedExceedsTotal)
        }
        _ => Err(ValidationError::NotIntegers),
    }
}

/// Classify a JSON value as an integer, or `None` if it is not one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integral(value: &Value) -> Option<Integral> {
    let Value::Number(number) = value else {
        return None;
    };

    if let Some(unsigned) = number.as_u64() {
        return Some(
            u32::try_from(unsigned).map_or(Integral::TooLarge, Integral::InRange),
        );
    }
    if number.as_i64().is_some() {
        // as_u64 failed, so the value is below zero.
        return Some(Integral::Negative);
    }

    let float = number.as_f64()?;
    if !float.is_finite() || float.fract() != 0.0 {
        return None;
    }
    if float < 0.0 {
        return Some(Integral::Negative);
    }
    if float > f64::from(u32::MAX) {
        return Some(Integral::TooLarge);
    }
    // Integral and within range, so the cast is exact.
    Some(Integral::InRange(float as u32))
}
