//! Pluggable directions providers: trait abstraction for route-polyline
//! backends.
//!
//! Three implementations, selectable via [`RouteProviderKind`]:
//!
//! - **`MockRouteProvider`**: Static jeepney-corridor tables. Zero dependencies.
//! - **`TableRouteProvider`**: Loads a JSON route table from disk.
//! - **`OsrmRouteProvider`** (feature `osrm`): Calls a local/remote OSRM HTTP endpoint.
//!
//! A provider's polyline is display-only enrichment for the map. Fare and
//! arrival distances always come from [`crate::geo`], never from a provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo::{self, Coordinate};
use crate::session::MINUTES_PER_KM;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Result of a route query between an origin and a named destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Polyline along the corridor, for display.
    pub waypoints: Vec<Coordinate>,
    /// Straight-line or road-network distance in kilometres.
    pub distance_km: f64,
    /// Estimated travel time in seconds.
    pub duration_secs: f64,
    /// Positions of jeepneys currently plying the corridor (mock data).
    pub jeepney_markers: Vec<Coordinate>,
}

/// Which directions backend to use. Serializes into client configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub enum RouteProviderKind {
    /// Static corridor tables, zero external dependencies.
    #[default]
    Mock,
    /// Route table loaded from a JSON file at startup.
    Table { path: String },
    /// OSRM HTTP endpoint (e.g. `"http://localhost:5000"`).
    #[cfg(feature = "osrm")]
    Osrm { endpoint: String },
}

/// Trait for directions backends. Implementations must be `Send + Sync` so a
/// boxed provider can be shared with the map-rendering collaborator.
pub trait RouteProvider: Send + Sync {
    /// Compute a display route to the named destination. Returns `None` if
    /// the backend cannot produce one.
    fn route(
        &self,
        origin: Coordinate,
        destination_name: &str,
        destination: Coordinate,
    ) -> Option<RoutePlan>;
}

// ---------------------------------------------------------------------------
// Mock provider (always available)
// ---------------------------------------------------------------------------

/// One hardcoded jeepney corridor. Points are (latitude, longitude).
struct Corridor {
    destination: &'static str,
    line: &'static [(f64, f64)],
    jeepneys: &'static [(f64, f64)],
}

/// Laguna-area corridors out of San Pedro, plus the Calamba–Cabuyao line.
const CORRIDORS: &[Corridor] = &[
    Corridor {
        destination: "Crossing",
        line: &[
            (14.3553, 121.0644),
            (14.3580, 121.0710),
            (14.3620, 121.0780),
            (14.3670, 121.0850),
            (14.3700, 121.0920),
            (14.3720, 121.0950),
        ],
        jeepneys: &[
            (14.3595, 121.0740),
            (14.3650, 121.0830),
            (14.3690, 121.0900),
        ],
    },
    Corridor {
        destination: "Pulo",
        line: &[
            (14.3553, 121.0644),
            (14.3580, 121.0690),
            (14.3600, 121.0730),
            (14.3625, 121.0770),
            (14.3650, 121.0800),
        ],
        jeepneys: &[(14.3590, 121.0710), (14.3615, 121.0750)],
    },
    Corridor {
        destination: "Market Area",
        line: &[
            (14.3553, 121.0644),
            (14.3590, 121.0730),
            (14.3640, 121.0820),
            (14.3690, 121.0910),
            (14.3750, 121.1000),
            (14.3800, 121.1100),
        ],
        jeepneys: &[
            (14.3615, 121.0775),
            (14.3665, 121.0865),
            (14.3720, 121.0955),
        ],
    },
    Corridor {
        destination: "Banlic",
        line: &[
            (14.3553, 121.0644),
            (14.3585, 121.0720),
            (14.3630, 121.0800),
            (14.3670, 121.0880),
            (14.3710, 121.0960),
            (14.3750, 121.1050),
        ],
        jeepneys: &[
            (14.3608, 121.0760),
            (14.3650, 121.0840),
            (14.3690, 121.0920),
        ],
    },
    Corridor {
        destination: "Malaban",
        line: &[
            (14.3553, 121.0644),
            (14.3600, 121.0750),
            (14.3660, 121.0850),
            (14.3720, 121.0950),
            (14.3780, 121.1050),
            (14.3820, 121.1150),
            (14.3850, 121.1200),
        ],
        jeepneys: &[
            (14.3630, 121.0800),
            (14.3690, 121.0900),
            (14.3750, 121.1000),
            (14.3805, 121.1100),
        ],
    },
    Corridor {
        destination: "Cabuyao",
        line: &[
            (14.2110, 121.1653),
            (14.2250, 121.1600),
            (14.2400, 121.1520),
            (14.2550, 121.1450),
            (14.2670, 121.1380),
            (14.2730, 121.1300),
            (14.2780, 121.1239),
        ],
        jeepneys: &[
            (14.2325, 121.1560),
            (14.2475, 121.1485),
            (14.2700, 121.1340),
        ],
    },
];

/// Corridor used when the requested destination has no table entry.
const DEFAULT_CORRIDOR: &str = "Crossing";

fn to_coordinates(points: &[(f64, f64)]) -> Vec<Coordinate> {
    points
        .iter()
        .map(|&(latitude, longitude)| Coordinate {
            latitude,
            longitude,
        })
        .collect()
}

/// Serves the static corridor tables. Unknown destinations fall back to the
/// default corridor, so a route lookup never yields an empty polyline.
pub struct MockRouteProvider;

impl MockRouteProvider {
    fn corridor(destination_name: &str) -> &'static Corridor {
        CORRIDORS
            .iter()
            .find(|corridor| corridor.destination == destination_name)
            .unwrap_or_else(|| {
                CORRIDORS
                    .iter()
                    .find(|corridor| corridor.destination == DEFAULT_CORRIDOR)
                    .expect("default corridor is present in the table")
            })
    }
}

impl RouteProvider for MockRouteProvider {
    fn route(
        &self,
        origin: Coordinate,
        destination_name: &str,
        destination: Coordinate,
    ) -> Option<RoutePlan> {
        let corridor = Self::corridor(destination_name);
        // Distance and time come from the requested endpoints, not the
        // table: the polyline is display-only.
        let distance_km = geo::distance_km(origin, destination).ok()?;
        Some(RoutePlan {
            waypoints: to_coordinates(corridor.line),
            distance_km,
            duration_secs: distance_km * MINUTES_PER_KM * 60.0,
            jeepney_markers: to_coordinates(corridor.jeepneys),
        })
    }
}

// ---------------------------------------------------------------------------
// Table provider (JSON file)
// ---------------------------------------------------------------------------

/// Route table keyed by destination name, loaded from a JSON file at
/// startup. A miss returns `None`; wrap in [`CachedRouteProvider`] for the
/// mock fallback.
pub struct TableRouteProvider {
    table: HashMap<String, RoutePlan>,
}

impl TableRouteProvider {
    /// Load from a serde_json-serialized file.
    pub fn from_file(path: &str) -> Result<Self, crate::error::CoreError> {
        let data = std::fs::read(path)
            .map_err(|err| crate::error::CoreError::Storage(format!("{path}: {err}")))?;
        let table: HashMap<String, RoutePlan> = serde_json::from_slice(&data)
            .map_err(|err| crate::error::CoreError::Storage(format!("{path}: {err}")))?;
        Ok(Self { table })
    }

    /// Create from an in-memory table (useful for tests).
    pub fn from_table(table: HashMap<String, RoutePlan>) -> Self {
        Self { table }
    }

    /// Serialize a table to a file.
    pub fn save_to_file(
        table: &HashMap<String, RoutePlan>,
        path: &str,
    ) -> Result<(), crate::error::CoreError> {
        let data = serde_json::to_vec_pretty(table)
            .map_err(|err| crate::error::CoreError::Storage(err.to_string()))?;
        std::fs::write(path, data)
            .map_err(|err| crate::error::CoreError::Storage(format!("{path}: {err}")))
    }
}

impl RouteProvider for TableRouteProvider {
    fn route(
        &self,
        _origin: Coordinate,
        destination_name: &str,
        _destination: Coordinate,
    ) -> Option<RoutePlan> {
        self.table.get(destination_name).cloned()
    }
}

// ---------------------------------------------------------------------------
// OSRM provider (behind `osrm` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "osrm")]
pub mod osrm {
    use super::*;
    use reqwest::blocking::Client;
    use std::time::Duration;

    /// Routes via an OSRM HTTP endpoint.
    pub struct OsrmRouteProvider {
        client: Client,
        endpoint: String,
    }

    impl OsrmRouteProvider {
        pub fn new(endpoint: &str) -> Self {
            let client = Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("failed to build HTTP client");
            Self {
                client,
                endpoint: endpoint.trim_end_matches('/').to_string(),
            }
        }
    }

    /// Minimal OSRM JSON response structures.
    #[derive(Deserialize)]
    struct OsrmResponse {
        code: String,
        routes: Option<Vec<OsrmRoute>>,
    }

    #[derive(Deserialize)]
    struct OsrmRoute {
        distance: f64, // metres
        duration: f64, // seconds
        geometry: OsrmGeometry,
    }

    #[derive(Deserialize)]
    struct OsrmGeometry {
        coordinates: Vec<Vec<f64>>, // [lng, lat]
    }

    impl RouteProvider for OsrmRouteProvider {
        fn route(
            &self,
            origin: Coordinate,
            _destination_name: &str,
            destination: Coordinate,
        ) -> Option<RoutePlan> {
            let url = format!(
                "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
                self.endpoint,
                origin.longitude,
                origin.latitude,
                destination.longitude,
                destination.latitude,
            );

            let resp: OsrmResponse = match self.client.get(&url).send() {
                Ok(r) => match r.json() {
                    Ok(j) => j,
                    Err(_) => return None,
                },
                Err(_) => return None,
            };

            if resp.code != "Ok" {
                return None;
            }

            let route = resp.routes?.into_iter().next()?;

            let waypoints: Vec<Coordinate> = route
                .geometry
                .coordinates
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| Coordinate {
                    latitude: c[1],
                    longitude: c[0],
                })
                .collect();

            Some(RoutePlan {
                waypoints,
                distance_km: route.distance / 1000.0,
                duration_secs: route.duration,
                jeepney_markers: Vec::new(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Caching wrapper
// ---------------------------------------------------------------------------

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// LRU-cached wrapper around any [`RouteProvider`].
///
/// Cache key is the destination name. On cache miss the inner provider is
/// queried; on inner failure the mock corridor tables are tried before
/// returning `None`, so a failing directions collaborator degrades to the
/// local approximation instead of leaving the trip without a route.
pub struct CachedRouteProvider {
    inner: Box<dyn RouteProvider>,
    cache: Mutex<LruCache<String, RoutePlan>>,
    fallback_to_mock: bool,
}

impl CachedRouteProvider {
    pub fn new(inner: Box<dyn RouteProvider>, capacity: usize, fallback_to_mock: bool) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("cache capacity must be > 0"),
            )),
            fallback_to_mock,
        }
    }
}

impl RouteProvider for CachedRouteProvider {
    fn route(
        &self,
        origin: Coordinate,
        destination_name: &str,
        destination: Coordinate,
    ) -> Option<RoutePlan> {
        // Fast path: cache hit
        {
            let mut cache = self.cache.lock().ok()?;
            if let Some(cached) = cache.get(destination_name) {
                return Some(cached.clone());
            }
        }

        // Slow path: query inner provider
        let result = self
            .inner
            .route(origin, destination_name, destination)
            .or_else(|| {
                if self.fallback_to_mock {
                    tracing::debug!(destination_name, "directions backend failed, using mock corridor");
                    MockRouteProvider.route(origin, destination_name, destination)
                } else {
                    None
                }
            });

        if let Some(ref plan) = result {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(destination_name.to_string(), plan.clone());
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Factory: build a provider from RouteProviderKind
// ---------------------------------------------------------------------------

/// Default route cache capacity for the table and OSRM providers.
const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 256;

/// Construct a boxed [`RouteProvider`] from a [`RouteProviderKind`]
/// descriptor.
///
/// - `Mock` is returned without caching (it is a static lookup).
/// - `Table` and `Osrm` providers are wrapped in a [`CachedRouteProvider`]
///   with mock fallback on failure.
pub fn build_route_provider(kind: &RouteProviderKind) -> Box<dyn RouteProvider> {
    match kind {
        RouteProviderKind::Mock => Box::new(MockRouteProvider),

        RouteProviderKind::Table { path } => match TableRouteProvider::from_file(path) {
            Ok(provider) => Box::new(CachedRouteProvider::new(
                Box::new(provider),
                DEFAULT_ROUTE_CACHE_CAPACITY,
                true,
            )),
            Err(err) => {
                tracing::warn!(path = %path, %err, "failed to load route table, falling back to mock corridors");
                Box::new(MockRouteProvider)
            }
        },

        #[cfg(feature = "osrm")]
        RouteProviderKind::Osrm { endpoint } => {
            let inner = Box::new(osrm::OsrmRouteProvider::new(endpoint));
            Box::new(CachedRouteProvider::new(
                inner,
                DEFAULT_ROUTE_CACHE_CAPACITY,
                true,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{market_area, san_pedro};

    /// A directions backend that always fails, for fallback tests.
    struct FailingProvider;

    impl RouteProvider for FailingProvider {
        fn route(&self, _: Coordinate, _: &str, _: Coordinate) -> Option<RoutePlan> {
            None
        }
    }

    #[test]
    fn mock_provider_serves_known_corridor() {
        let plan = MockRouteProvider
            .route(san_pedro(), "Market Area", market_area())
            .expect("plan");

        assert_eq!(plan.waypoints.len(), 6);
        assert_eq!(plan.jeepney_markers.len(), 3);
        assert!(plan.distance_km > 5.4 && plan.distance_km < 5.8);
        // 3 min per km.
        assert!((plan.duration_secs - plan.distance_km * 180.0).abs() < 1e-9);
    }

    #[test]
    fn mock_provider_falls_back_to_default_corridor() {
        let plan = MockRouteProvider
            .route(san_pedro(), "Unmapped Barangay", market_area())
            .expect("plan");

        // The default (Crossing) polyline, never an empty route.
        assert!(!plan.waypoints.is_empty());
        assert_eq!(
            plan.waypoints,
            MockRouteProvider
                .route(san_pedro(), "Crossing", market_area())
                .expect("default plan")
                .waypoints
        );
    }

    #[test]
    fn failing_backend_degrades_to_mock_corridor() {
        let provider = CachedRouteProvider::new(Box::new(FailingProvider), 16, true);

        let plan = provider
            .route(san_pedro(), "Market Area", market_area())
            .expect("plan");
        assert!(!plan.waypoints.is_empty());
    }

    #[test]
    fn failing_backend_without_fallback_returns_none() {
        let provider = CachedRouteProvider::new(Box::new(FailingProvider), 16, false);
        assert!(provider
            .route(san_pedro(), "Market Area", market_area())
            .is_none());
    }

    #[test]
    fn cached_provider_replays_hits() {
        let mut table = HashMap::new();
        let plan = MockRouteProvider
            .route(san_pedro(), "Pulo", market_area())
            .expect("plan");
        table.insert("Pulo".to_string(), plan.clone());

        let provider = CachedRouteProvider::new(
            Box::new(TableRouteProvider::from_table(table)),
            16,
            false,
        );

        let first = provider.route(san_pedro(), "Pulo", market_area());
        let second = provider.route(san_pedro(), "Pulo", market_area());
        assert_eq!(first, second);
        assert_eq!(first, Some(plan));
    }

    #[test]
    fn table_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("routes.json");
        let path = path.to_str().expect("utf-8 path");

        let mut table = HashMap::new();
        table.insert(
            "Crossing".to_string(),
            MockRouteProvider
                .route(san_pedro(), "Crossing", market_area())
                .expect("plan"),
        );
        TableRouteProvider::save_to_file(&table, path).expect("save");

        let provider = TableRouteProvider::from_file(path).expect("load");
        let plan = provider
            .route(san_pedro(), "Crossing", market_area())
            .expect("plan");
        assert_eq!(plan.waypoints.len(), 6);
        assert!(provider
            .route(san_pedro(), "Banlic", market_area())
            .is_none());
    }

    #[test]
    fn factory_falls_back_to_mock_on_missing_table() {
        let provider = build_route_provider(&RouteProviderKind::Table {
            path: "/nonexistent/routes.json".to_string(),
        });

        let plan = provider
            .route(san_pedro(), "Crossing", market_area())
            .expect("plan");
        assert!(!plan.waypoints.is_empty());
    }
}
