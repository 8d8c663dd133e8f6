//! Geocoding/places collaborator: destination search and reverse geocoding.
//!
//! The static provider carries the popular-destination list and keeps the
//! client fully functional offline; the Mapbox provider (feature `mapbox`)
//! talks to the live geocoding API. Failures never crash the core: they
//! degrade to the unknown-location sentinel and the caller may retry.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::{self, Coordinate};

/// Sentinel address when reverse geocoding cannot resolve a position.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Radius within which a seeded place answers a reverse-geocode query, km.
const REVERSE_GEOCODE_RADIUS_KM: f64 = 2.0;

/// One searchable destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub address: String,
    pub location: Coordinate,
}

/// Trait for geocoding backends.
pub trait PlacesProvider: Send + Sync {
    /// Search destinations matching `query`. An empty query yields an empty
    /// result rather than an error.
    fn search(&self, query: &str) -> Result<Vec<Place>, CoreError>;

    /// Resolve a position to a display address; [`UNKNOWN_LOCATION`] when
    /// nothing matches.
    fn reverse_geocode(&self, position: Coordinate) -> Result<String, CoreError>;
}

/// Quick-access destinations shown on the passenger dashboard, with their
/// corridor endpoints.
pub fn popular_destinations() -> Vec<Place> {
    let seeded = [
        ("Crossing", "Coolbase iCity", 14.3720, 121.0950),
        ("Pulo", "Coolbase Area", 14.3650, 121.0800),
        ("Market Area", "Midas iCity", 14.3800, 121.1100),
        ("Banlic", "Midas iCity", 14.3750, 121.1050),
        ("Malaban", "Malaban iCity", 14.3850, 121.1200),
    ];
    seeded
        .into_iter()
        .map(|(name, address, latitude, longitude)| Place {
            name: name.to_string(),
            address: address.to_string(),
            location: Coordinate {
                latitude,
                longitude,
            },
        })
        .collect()
}

/// Offline provider backed by a fixed place list.
pub struct StaticPlacesProvider {
    places: Vec<Place>,
}

impl Default for StaticPlacesProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticPlacesProvider {
    /// Seeded with the popular destinations.
    pub fn new() -> Self {
        Self {
            places: popular_destinations(),
        }
    }

    pub fn with_places(places: Vec<Place>) -> Self {
        Self { places }
    }
}

impl PlacesProvider for StaticPlacesProvider {
    fn search(&self, query: &str) -> Result<Vec<Place>, CoreError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .places
            .iter()
            .filter(|place| {
                place.name.to_lowercase().contains(&needle)
                    || place.address.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    fn reverse_geocode(&self, position: Coordinate) -> Result<String, CoreError> {
        position.validate()?;
        let mut best: Option<(f64, &Place)> = None;
        for place in &self.places {
            let km = geo::distance_km(position, place.location)?;
            if best.map_or(true, |(best_km, _)| km < best_km) {
                best = Some((km, place));
            }
        }
        match best {
            Some((km, place)) if km <= REVERSE_GEOCODE_RADIUS_KM => Ok(place.address.clone()),
            _ => Ok(UNKNOWN_LOCATION.to_string()),
        }
    }
}

/// First two comma-separated segments of a formatted address, the way the
/// dashboard abbreviates the current location.
pub fn shorten_address(address: &str) -> String {
    address
        .split(',')
        .take(2)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Mapbox provider (behind `mapbox` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "mapbox")]
pub mod mapbox {
    use super::*;
    use reqwest::blocking::Client;
    use std::time::Duration;

    const GEOCODING_ENDPOINT: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

    /// Forward/reverse geocoding against the Mapbox API, limited to the
    /// Philippines the way the client app queries it.
    pub struct MapboxPlacesProvider {
        client: Client,
        access_token: String,
    }

    impl MapboxPlacesProvider {
        pub fn new(access_token: impl Into<String>) -> Self {
            let client = Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("failed to build HTTP client");
            Self {
                client,
                access_token: access_token.into(),
            }
        }

        fn fetch(&self, url: &str) -> Result<GeocodeResponse, CoreError> {
            self.client
                .get(url)
                .query(&[("access_token", self.access_token.as_str())])
                .send()
                .and_then(|response| response.json())
                .map_err(|err| CoreError::ExternalServiceFailure(err.to_string()))
        }
    }

    #[derive(Deserialize)]
    struct GeocodeResponse {
        features: Option<Vec<Feature>>,
    }

    #[derive(Deserialize)]
    struct Feature {
        text: Option<String>,
        place_name: Option<String>,
        center: Option<Vec<f64>>, // [lng, lat]
    }

    impl PlacesProvider for MapboxPlacesProvider {
        fn search(&self, query: &str) -> Result<Vec<Place>, CoreError> {
            if query.trim().is_empty() {
                return Ok(Vec::new());
            }
            let url = format!(
                "{}/{}.json?country=ph",
                GEOCODING_ENDPOINT,
                urlencoding::encode(query.trim())
            );
            let response = self.fetch(&url)?;

            let places = response
                .features
                .unwrap_or_default()
                .into_iter()
                .filter_map(|feature| {
                    let center = feature.center?;
                    if center.len() < 2 {
                        return None;
                    }
                    let location = Coordinate::new(center[1], center[0]).ok()?;
                    let place_name = feature.place_name?;
                    Some(Place {
                        name: feature.text.unwrap_or_else(|| place_name.clone()),
                        address: place_name,
                        location,
                    })
                })
                .collect();
            Ok(places)
        }

        fn reverse_geocode(&self, position: Coordinate) -> Result<String, CoreError> {
            position.validate()?;
            let url = format!(
                "{}/{},{}.json",
                GEOCODING_ENDPOINT, position.longitude, position.latitude
            );
            let response = self.fetch(&url)?;

            Ok(response
                .features
                .unwrap_or_default()
                .into_iter()
                .find_map(|feature| feature.place_name)
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{coordinate_meters_north, market_area};

    #[test]
    fn search_matches_name_case_insensitively() {
        let provider = StaticPlacesProvider::new();

        let hits = provider.search("market").expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Market Area");
    }

    #[test]
    fn search_matches_address_too() {
        let provider = StaticPlacesProvider::new();

        let hits = provider.search("midas").expect("search");
        let names: Vec<&str> = hits.iter().map(|place| place.name.as_str()).collect();
        assert_eq!(names, ["Market Area", "Banlic"]);
    }

    #[test]
    fn empty_query_yields_no_places() {
        let provider = StaticPlacesProvider::new();
        assert!(provider.search("").expect("search").is_empty());
        assert!(provider.search("   ").expect("search").is_empty());
    }

    #[test]
    fn reverse_geocode_answers_near_a_seeded_place() {
        let provider = StaticPlacesProvider::new();
        let near_market = coordinate_meters_north(market_area(), 150.0);

        let address = provider.reverse_geocode(near_market).expect("reverse");
        assert_eq!(address, "Midas iCity");
    }

    #[test]
    fn reverse_geocode_far_from_everything_is_unknown() {
        let provider = StaticPlacesProvider::new();
        let manila_bay = Coordinate::new(14.55, 120.80).expect("coordinate");

        let address = provider.reverse_geocode(manila_bay).expect("reverse");
        assert_eq!(address, UNKNOWN_LOCATION);
    }

    #[test]
    fn reverse_geocode_rejects_malformed_position() {
        let provider = StaticPlacesProvider::new();
        let bad = Coordinate {
            latitude: 200.0,
            longitude: 121.0,
        };
        assert!(provider.reverse_geocode(bad).is_err());
    }

    #[test]
    fn shorten_address_keeps_first_two_segments() {
        assert_eq!(
            shorten_address("Unit 4, Real Street, San Pedro, Laguna"),
            "Unit 4, Real Street"
        );
        assert_eq!(shorten_address("San Pedro"), "San Pedro");
    }

    #[test]
    fn reverse_geocode_picks_the_nearest_place() {
        // 100 m from Crossing, with Pulo also inside the radius; the nearer
        // place answers.
        let provider = StaticPlacesProvider::new();
        let near_crossing = coordinate_meters_north(crate::test_helpers::crossing(), 100.0);

        let address = provider.reverse_geocode(near_crossing).expect("reverse");
        assert_eq!(address, "Coolbase iCity");
    }
}
