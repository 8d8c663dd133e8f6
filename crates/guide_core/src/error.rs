//! Crate-wide error taxonomy.
//!
//! Pure computations (`fare`, `geo`, `arrival`) return these errors and never
//! suppress them; the trip state machine absorbs transition errors locally so
//! the UI can keep rendering the current state.

use thiserror::Error;

use crate::flow::TripState;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input rejected before any mutation: negative distance,
    /// non-finite or out-of-range coordinate, non-positive collection amount.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No current location is known and the operation requires one.
    /// Never defaulted to a stale or map-center sentinel position.
    #[error("current position unavailable")]
    PositionUnavailable,

    /// A trip-flow operation that is not valid in the current state.
    /// The state is left unchanged.
    #[error("operation `{operation}` is not valid in state {state:?}")]
    InvalidTransition {
        state: TripState,
        operation: &'static str,
    },

    /// A geocoding/directions/payment collaborator failed. Where a local
    /// fallback exists (mock corridors) the core degrades instead of
    /// surfacing this.
    #[error("external service failure: {0}")]
    ExternalServiceFailure(String),

    /// Local profile storage failed to read or write a record.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        CoreError::InvalidArgument(message.into())
    }
}
