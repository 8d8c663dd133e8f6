//! Arrival detection: compare a live position against the destination and
//! report when the proximity threshold is crossed.
//!
//! Stateless per call; the caller (the trip flow) holds the "already arrived"
//! latch so a chatty position feed cannot raise duplicate arrival events.

use crate::error::CoreError;
use crate::geo::{self, Coordinate};

/// Proximity below which a live position counts as arrived, in metres.
pub const DEFAULT_ARRIVAL_THRESHOLD_M: f64 = 50.0;

/// Result of one proximity check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalCheck {
    pub has_arrived: bool,
    pub distance_meters: f64,
}

impl ArrivalCheck {
    /// Remaining distance in the display format the tracking banner relies
    /// on: `"1.5 KM"` at or beyond a kilometre, `"30 M"` below.
    pub fn distance_display(&self) -> String {
        format_distance(self.distance_meters)
    }
}

/// Check a live position against the destination.
///
/// `has_arrived` is true when the distance is strictly below
/// `threshold_meters`.
pub fn check(
    live_position: Coordinate,
    destination: Coordinate,
    threshold_meters: f64,
) -> Result<ArrivalCheck, CoreError> {
    if !threshold_meters.is_finite() || threshold_meters <= 0.0 {
        return Err(CoreError::invalid_argument(format!(
            "arrival threshold must be > 0, got {threshold_meters}"
        )));
    }
    let distance_meters = geo::distance_meters(live_position, destination)?;
    Ok(ArrivalCheck {
        has_arrived: distance_meters < threshold_meters,
        distance_meters,
    })
}

/// Format a distance for display: values at or above 1000 m render as
/// kilometres with one decimal, below as whole metres.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} KM", meters / 1000.0)
    } else {
        format!("{meters:.0} M")
    }
}
