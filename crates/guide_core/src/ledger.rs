//! Conductor-side fare collection log: each boarding's fare as it is
//! collected, with a running total for the shift.
//!
//! Timestamps are caller-supplied milliseconds; the core owns no clock.

use crate::error::CoreError;
use crate::fare::{FareQuote, RiderCategory};

/// One collected fare.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub amount: f64,
    pub category: RiderCategory,
    pub recorded_at_ms: u64,
}

/// A shift's fare collections.
#[derive(Debug, Default)]
pub struct CollectionLog {
    entries: Vec<CollectionEntry>,
}

impl CollectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a collected amount (the conductor may key in a custom fare).
    /// Non-positive or non-finite amounts are rejected before any mutation.
    pub fn record(
        &mut self,
        amount: f64,
        category: RiderCategory,
        recorded_at_ms: u64,
    ) -> Result<(), CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::invalid_argument(format!(
                "collection amount must be > 0, got {amount}"
            )));
        }
        self.entries.push(CollectionEntry {
            amount,
            category,
            recorded_at_ms,
        });
        Ok(())
    }

    /// Record a computed quote's net fare.
    pub fn record_quote(
        &mut self,
        quote: &FareQuote,
        category: RiderCategory,
        recorded_at_ms: u64,
    ) -> Result<(), CoreError> {
        self.record(quote.net_fare, category, recorded_at_ms)
    }

    /// Total pesos collected this shift.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    /// Number of boardings logged.
    pub fn passenger_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries in collection order.
    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fare;

    #[test]
    fn totals_accumulate_in_order() {
        let mut log = CollectionLog::new();
        log.record(13.0, RiderCategory::Regular, 1_000).expect("record");
        log.record(12.0, RiderCategory::Senior, 2_000).expect("record");
        log.record(15.0, RiderCategory::Regular, 3_000).expect("record");

        assert_eq!(log.passenger_count(), 3);
        assert_eq!(log.total(), 40.0);
        assert_eq!(log.entries()[1].category, RiderCategory::Senior);
    }

    #[test]
    fn quote_net_fare_is_what_gets_logged() {
        let mut log = CollectionLog::new();
        let quote = fare::quote(5.2, RiderCategory::Senior).expect("quote");
        log.record_quote(&quote, RiderCategory::Senior, 1_000)
            .expect("record");

        assert_eq!(log.total(), 12.0);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let mut log = CollectionLog::new();
        assert!(log.record(0.0, RiderCategory::Regular, 1_000).is_err());
        assert!(log.record(-5.0, RiderCategory::Regular, 1_000).is_err());
        assert!(log.record(f64::NAN, RiderCategory::Regular, 1_000).is_err());
        assert_eq!(log.passenger_count(), 0);
    }
}
