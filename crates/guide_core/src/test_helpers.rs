//! Test helpers for common test setup and utilities.
//!
//! This module provides shared fixtures to reduce duplication across test
//! files.

use crate::geo::{Coordinate, EARTH_RADIUS_M};
use crate::session::{RouteSession, TransportMeta};

/// The standard rider origin used across test files: San Pedro, Laguna.
pub fn san_pedro() -> Coordinate {
    Coordinate {
        latitude: 14.3553,
        longitude: 121.0644,
    }
}

/// The Crossing corridor endpoint, ~3.8 km from [`san_pedro`].
pub fn crossing() -> Coordinate {
    Coordinate {
        latitude: 14.3720,
        longitude: 121.0950,
    }
}

/// The Market Area corridor endpoint, ~5.6 km from [`san_pedro`], far
/// enough to exercise the per-kilometre fare surcharge.
pub fn market_area() -> Coordinate {
    Coordinate {
        latitude: 14.3800,
        longitude: 121.1100,
    }
}

/// A point the given number of metres due north of `base`, for building
/// positions at a known distance.
pub fn coordinate_meters_north(base: Coordinate, meters: f64) -> Coordinate {
    let dlat_degrees = (meters / EARTH_RADIUS_M).to_degrees();
    Coordinate {
        latitude: base.latitude + dlat_degrees,
        longitude: base.longitude,
    }
}

/// A session with the Market Area trip already selected.
pub fn session_with_trip() -> RouteSession {
    let mut session = RouteSession::new();
    session
        .set_trip(
            san_pedro(),
            "Market Area",
            market_area(),
            TransportMeta::jeepney("Market Area"),
        )
        .expect("test trip should be valid");
    session
}
