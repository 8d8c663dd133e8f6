//! Jeepney fare engine: distance-tiered pricing with PWD/senior discounts.
//!
//! Fully pure and referentially transparent; [`quote_cached`] memoizes by
//! `(distance_km, category)`.

use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Base fare in pesos, covering the first 4 km.
pub const BASE_FARE: f64 = 13.00;

/// Surcharge per kilometre beyond the base distance.
pub const PER_KM_RATE: f64 = 1.50;

/// Discount rate for PWD and senior riders.
pub const DISCOUNT_RATE: f64 = 0.20;

/// Distance covered by the base fare, in kilometres.
pub const BASE_DISTANCE_KM: f64 = 4.0;

/// Fixed currency code carried on every quote.
pub const CURRENCY: &str = "PHP";

/// Rider classification affecting discount eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiderCategory {
    Regular,
    Pwd,
    Senior,
}

impl RiderCategory {
    /// Whether this category is entitled to the statutory discount.
    pub fn discounted(self) -> bool {
        matches!(self, RiderCategory::Pwd | RiderCategory::Senior)
    }
}

/// One fare computation. Created fresh per request, never mutated.
///
/// Invariant: `net_fare = gross_fare - discount`, with `gross_fare` already
/// rounded to the nearest whole peso before the discount is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareQuote {
    pub gross_fare: f64,
    pub discount: f64,
    pub net_fare: f64,
    pub distance_km: f64,
    pub currency: String,
}

impl FareQuote {
    /// Net fare rendered the way the receipt shows it, e.g. `"₱15.00"`.
    pub fn net_display(&self) -> String {
        format!("₱{:.2}", self.net_fare)
    }

    pub fn gross_display(&self) -> String {
        format!("₱{:.2}", self.gross_fare)
    }

    pub fn discount_display(&self) -> String {
        format!("₱{:.2}", self.discount)
    }
}

/// Compute a fare quote for a trip of `distance_km` kilometres.
///
/// Gross fare is [`BASE_FARE`] for the first [`BASE_DISTANCE_KM`] kilometres
/// plus [`PER_KM_RATE`] per additional kilometre, rounded to the nearest
/// whole peso (half-up). PWD/senior riders get [`DISCOUNT_RATE`] off the
/// rounded gross. There is no upper distance cap; gross grows linearly.
///
/// A negative or non-finite distance is a contract violation and fails with
/// `InvalidArgument`; callers must resolve distance first (zero is fine and
/// yields the base fare).
pub fn quote(distance_km: f64, category: RiderCategory) -> Result<FareQuote, CoreError> {
    if !distance_km.is_finite() {
        return Err(CoreError::invalid_argument(
            "fare distance must be finite",
        ));
    }
    if distance_km < 0.0 {
        return Err(CoreError::invalid_argument(format!(
            "fare distance must be >= 0, got {distance_km}"
        )));
    }

    let mut gross_fare = BASE_FARE;
    if distance_km > BASE_DISTANCE_KM {
        gross_fare += (distance_km - BASE_DISTANCE_KM) * PER_KM_RATE;
    }
    // Nearest whole peso; f64::round is half-up for the positive amounts here.
    let gross_fare = gross_fare.round();

    let discount = if category.discounted() {
        gross_fare * DISCOUNT_RATE
    } else {
        0.0
    };

    Ok(FareQuote {
        gross_fare,
        discount,
        net_fare: gross_fare - discount,
        distance_km,
        currency: CURRENCY.to_string(),
    })
}

/// Global quote cache (1,000 entries). Key is the distance bit pattern plus
/// the category, so equal inputs always hit.
fn quote_cache() -> &'static Mutex<LruCache<(u64, RiderCategory), FareQuote>> {
    static CACHE: OnceLock<Mutex<LruCache<(u64, RiderCategory), FareQuote>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(1_000).expect("cache size must be non-zero"),
        ))
    })
}

/// Memoized [`quote`]. Same contract; safe because `quote` is pure.
pub fn quote_cached(distance_km: f64, category: RiderCategory) -> Result<FareQuote, CoreError> {
    let key = (distance_km.to_bits(), category);

    let mut cache = match quote_cache().lock() {
        Ok(guard) => guard,
        Err(_) => return quote(distance_km, category), // Fallback: compute without cache if mutex poisoned
    };

    if let Some(cached) = cache.get(&key) {
        return Ok(cached.clone());
    }

    let fresh = quote(distance_km, category)?;
    cache.put(key, fresh.clone());
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_fare_covers_first_four_km() {
        for distance in [0.0, 1.0, 2.5, 4.0] {
            let fare = quote(distance, RiderCategory::Regular).expect("quote");
            assert_eq!(fare.gross_fare, 13.0, "distance {distance}");
            assert_eq!(fare.discount, 0.0);
            assert_eq!(fare.net_fare, 13.0);
        }
    }

    #[test]
    fn surcharge_applies_beyond_four_km() {
        // 5.2 km -> 13 + 1.2 * 1.5 = 14.8, rounded to 15.
        let fare = quote(5.2, RiderCategory::Regular).expect("quote");
        assert_eq!(fare.gross_fare, 15.0);
        assert_eq!(fare.net_fare, 15.0);
        assert_eq!(fare.net_display(), "₱15.00");
    }

    #[test]
    fn gross_matches_rounded_formula_for_long_trips() {
        for distance in [4.1, 5.0, 6.3, 7.0, 12.4, 48.0] {
            let fare = quote(distance, RiderCategory::Regular).expect("quote");
            let expected = (BASE_FARE + (distance - BASE_DISTANCE_KM) * PER_KM_RATE).round();
            assert_eq!(fare.gross_fare, expected, "distance {distance}");
        }
    }

    #[test]
    fn discount_is_twenty_percent_of_rounded_gross() {
        for category in [RiderCategory::Pwd, RiderCategory::Senior] {
            let regular = quote(5.2, RiderCategory::Regular).expect("quote");
            let discounted = quote(5.2, category).expect("quote");

            assert_eq!(discounted.gross_fare, regular.gross_fare);
            assert_eq!(discounted.discount, regular.gross_fare * DISCOUNT_RATE);
            assert_eq!(
                discounted.net_fare,
                discounted.gross_fare - discounted.discount
            );
        }
    }

    #[test]
    fn senior_fare_at_five_point_two_km() {
        let fare = quote(5.2, RiderCategory::Senior).expect("quote");
        assert_eq!(fare.gross_fare, 15.0);
        assert_eq!(fare.discount, 3.0);
        assert_eq!(fare.net_fare, 12.0);
        assert_eq!(fare.net_display(), "₱12.00");
    }

    #[test]
    fn negative_distance_is_rejected() {
        let result = quote(-0.1, RiderCategory::Regular);
        assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn non_finite_distance_is_rejected() {
        assert!(quote(f64::NAN, RiderCategory::Regular).is_err());
        assert!(quote(f64::INFINITY, RiderCategory::Regular).is_err());
    }

    #[test]
    fn cached_quote_matches_fresh_quote() {
        let fresh = quote(6.3, RiderCategory::Pwd).expect("quote");
        let cached_once = quote_cached(6.3, RiderCategory::Pwd).expect("quote");
        let cached_twice = quote_cached(6.3, RiderCategory::Pwd).expect("quote");

        assert_eq!(fresh, cached_once);
        assert_eq!(fresh, cached_twice);
    }

    #[test]
    fn currency_is_fixed() {
        let fare = quote(1.0, RiderCategory::Regular).expect("quote");
        assert_eq!(fare.currency, CURRENCY);
    }
}
