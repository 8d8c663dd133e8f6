//! Geographic primitives: coordinates and great-circle distances.
//!
//! Distances here are the single source of truth for fare calculation and
//! arrival detection. Directions providers may return richer road polylines,
//! but those are display-only enrichment and never feed the fare.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth radius in metres, for the metres variant.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 point. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a validated coordinate. Non-finite components or components
    /// outside [-90, 90] / [-180, 180] are rejected with `InvalidArgument`
    /// rather than silently producing a zero distance later.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(CoreError::invalid_argument(
                "coordinate components must be finite",
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::invalid_argument(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::invalid_argument(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

fn haversine(a: Coordinate, b: Coordinate, radius: f64) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    radius * c
}

/// Great-circle distance between two coordinates in kilometres.
///
/// Symmetric (`distance_km(a, b) == distance_km(b, a)`), zero for identical
/// points. Both inputs are validated.
pub fn distance_km(a: Coordinate, b: Coordinate) -> Result<f64, CoreError> {
    a.validate()?;
    b.validate()?;
    Ok(haversine(a, b, EARTH_RADIUS_KM))
}

/// Great-circle distance between two coordinates in metres.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> Result<f64, CoreError> {
    a.validate()?;
    b.validate()?;
    Ok(haversine(a, b, EARTH_RADIUS_M))
}
