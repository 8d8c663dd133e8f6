//! Route session: the currently selected trip, the navigation flag, and the
//! rider's favorite places.
//!
//! Single logical owner, single-threaded mutation. The session never reaches
//! into ambient state; callers hand it coordinates and it derives distance,
//! fare, and the time estimate.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::fare::{self, FareQuote, RiderCategory};
use crate::geo::{self, Coordinate};

/// Estimated travel minutes per kilometre of straight-line distance.
pub const MINUTES_PER_KM: f64 = 3.0;

/// The jeepney option shown on the route-preview card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportMeta {
    /// Vehicle kind, e.g. "Jeepney".
    pub mode: String,
    /// Corridor label, e.g. "Crossing".
    pub route_label: String,
    /// Display-only traffic hint, e.g. "Light Traffic".
    pub traffic_status: String,
}

impl TransportMeta {
    pub fn jeepney(route_label: impl Into<String>) -> Self {
        Self {
            mode: "Jeepney".to_string(),
            route_label: route_label.into(),
            traffic_status: "Calculating...".to_string(),
        }
    }
}

/// The data bundle for one passenger's currently selected journey.
/// Owned exclusively by [`RouteSession`]; replaced wholesale on a new
/// destination selection and cleared on completion or cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub origin: Coordinate,
    pub destination_name: String,
    pub destination_location: Coordinate,
    pub distance_km: f64,
    pub fare: FareQuote,
    pub estimated_minutes: u32,
    pub transport: TransportMeta,
}

/// A saved place, keyed by exact name for lookup; insertion order is kept
/// for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoritePlace {
    pub name: String,
    pub display_location: String,
    pub coordinates: Coordinate,
}

#[derive(Debug, Default)]
pub struct RouteSession {
    trip: Option<TripRecord>,
    navigating: bool,
    favorites: Vec<FavoritePlace>,
}

impl RouteSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a trip: computes distance, fare (category `Regular`; category
    /// selection is not exposed at this call site), and the time estimate,
    /// then stores the record, replacing any existing one.
    pub fn set_trip(
        &mut self,
        origin: Coordinate,
        destination_name: impl Into<String>,
        destination_location: Coordinate,
        transport: TransportMeta,
    ) -> Result<&TripRecord, CoreError> {
        let distance_km = geo::distance_km(origin, destination_location)?;
        let fare = fare::quote(distance_km, RiderCategory::Regular)?;
        let estimated_minutes = (distance_km * MINUTES_PER_KM).round() as u32;

        self.trip = Some(TripRecord {
            origin,
            destination_name: destination_name.into(),
            destination_location,
            distance_km,
            fare,
            estimated_minutes,
            transport,
        });
        Ok(self.trip.as_ref().expect("trip was just stored"))
    }

    /// Reset to no active trip. Idempotent.
    pub fn clear_trip(&mut self) {
        self.trip = None;
    }

    pub fn current_trip(&self) -> Option<&TripRecord> {
        self.trip.as_ref()
    }

    /// Toggle live-tracking display, independent of the trip state. Used by
    /// the map-rendering collaborator.
    pub fn start_navigating(&mut self) {
        self.navigating = true;
    }

    pub fn stop_navigating(&mut self) {
        self.navigating = false;
    }

    pub fn is_navigating(&self) -> bool {
        self.navigating
    }

    pub fn add_favorite(&mut self, place: FavoritePlace) {
        self.favorites.push(place);
    }

    /// Remove every favorite whose name matches exactly (case-sensitive).
    pub fn remove_favorite(&mut self, name: &str) {
        self.favorites.retain(|favorite| favorite.name != name);
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.favorites.iter().any(|favorite| favorite.name == name)
    }

    /// Favorites in insertion order.
    pub fn favorites(&self) -> &[FavoritePlace] {
        &self.favorites
    }
}
