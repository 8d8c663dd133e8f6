//! Trip flow: the state machine sequencing one trip from search through
//! arrival.
//!
//! States walk Searching → RoutePreview → AwaitingPayment → Paid → Navigating
//! → Arrived, then loop back to Searching when the rider finishes; back
//! transitions follow a fixed map. Invalid operations are rejected with
//! `InvalidTransition` and leave the state unchanged, never silently
//! ignored, never fatal.
//!
//! The flow emits [`EffectRequest`]s into a FIFO queue drained by the UI
//! layer instead of calling collaborators itself, so the GPS and map
//! collaborators stay decoupled from the core.

use std::collections::VecDeque;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

use crate::arrival::{self, ArrivalCheck, DEFAULT_ARRIVAL_THRESHOLD_M};
use crate::error::CoreError;
use crate::fare::FareQuote;
use crate::geo::Coordinate;
use crate::session::{RouteSession, TransportMeta, TripRecord};
use crate::tracking::PositionUpdate;

/// Lifecycle of a single trip. Exactly one [`TripRecord`] is live from
/// `RoutePreview` through `Arrived`; `Searching` has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripState {
    Searching,
    RoutePreview,
    AwaitingPayment,
    Paid,
    Navigating,
    Arrived,
}

/// How the rider settles the fare. Settlement is simulated synchronously; in
/// a real deployment this is the boundary where a payment collaborator is
/// invoked and awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    GCash,
    Maya,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::GCash => "GCash",
            PaymentMethod::Maya => "Maya",
        }
    }
}

/// E-receipt issued when payment settles.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub reference: String,
    pub method: PaymentMethod,
    pub destination_name: String,
    pub fare: FareQuote,
}

/// Side-effect requests emitted toward external collaborators. The UI layer
/// drains these via [`TripFlow::next_effect`] and acts on them; the core
/// never invokes the GPS service directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectRequest {
    BeginLiveTracking,
    StopLiveTracking,
}

pub struct TripFlow {
    state: TripState,
    session: RouteSession,
    effects: VecDeque<EffectRequest>,
    receipt: Option<Receipt>,
    last_position: Option<PositionUpdate>,
    tracking_live: bool,
    arrival_threshold_m: f64,
}

impl Default for TripFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl TripFlow {
    pub fn new() -> Self {
        Self::with_session(RouteSession::new())
    }

    /// Build around an existing session (e.g. one carrying saved favorites).
    pub fn with_session(session: RouteSession) -> Self {
        Self {
            state: TripState::Searching,
            session,
            effects: VecDeque::new(),
            receipt: None,
            last_position: None,
            tracking_live: false,
            arrival_threshold_m: DEFAULT_ARRIVAL_THRESHOLD_M,
        }
    }

    pub fn with_arrival_threshold(mut self, threshold_meters: f64) -> Self {
        self.arrival_threshold_m = threshold_meters;
        self
    }

    pub fn state(&self) -> TripState {
        self.state
    }

    pub fn session(&self) -> &RouteSession {
        &self.session
    }

    /// Mutable session access for operations independent of the trip
    /// lifecycle (favorites, the navigation display flag).
    pub fn session_mut(&mut self) -> &mut RouteSession {
        &mut self.session
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Most recent live position applied, for map display.
    pub fn last_position(&self) -> Option<PositionUpdate> {
        self.last_position
    }

    /// Pop the next pending side-effect request, FIFO.
    pub fn next_effect(&mut self) -> Option<EffectRequest> {
        self.effects.pop_front()
    }

    /// Select a destination while searching.
    ///
    /// Requires a known current position: with `None` this fails with
    /// `PositionUnavailable` and no trip record is created; a stale or
    /// map-center default position is never substituted for fare
    /// computation.
    pub fn select_destination(
        &mut self,
        current_position: Option<Coordinate>,
        destination_name: impl Into<String>,
        destination_location: Coordinate,
        transport: TransportMeta,
    ) -> Result<&TripRecord, CoreError> {
        self.expect_state(TripState::Searching, "select_destination")?;
        let origin = current_position.ok_or(CoreError::PositionUnavailable)?;

        self.session
            .set_trip(origin, destination_name, destination_location, transport)?;
        self.transition(TripState::RoutePreview);
        Ok(self.session.current_trip().expect("trip was just stored"))
    }

    /// Start the route from the preview: requests live tracking from the GPS
    /// collaborator and moves on to payment.
    pub fn start_route(&mut self) -> Result<(), CoreError> {
        self.expect_state(TripState::RoutePreview, "start_route")?;
        self.transition(TripState::AwaitingPayment);
        self.effects.push_back(EffectRequest::BeginLiveTracking);
        self.tracking_live = true;
        Ok(())
    }

    /// Settle the fare with the chosen method and issue the e-receipt.
    pub fn pay(&mut self, method: PaymentMethod) -> Result<&Receipt, CoreError> {
        self.expect_state(TripState::AwaitingPayment, "pay")?;
        let Some(trip) = self.session.current_trip() else {
            return Err(CoreError::InvalidTransition {
                state: self.state,
                operation: "pay",
            });
        };

        let receipt = Receipt {
            reference: receipt_reference(),
            method,
            destination_name: trip.destination_name.clone(),
            fare: trip.fare.clone(),
        };
        self.receipt = Some(receipt);
        self.transition(TripState::Paid);
        Ok(self.receipt.as_ref().expect("receipt was just stored"))
    }

    /// Leave the receipt and begin navigating to the destination.
    pub fn proceed_to_navigation(&mut self) -> Result<(), CoreError> {
        self.expect_state(TripState::Paid, "proceed_to_navigation")?;
        self.session.start_navigating();
        self.transition(TripState::Navigating);
        Ok(())
    }

    /// Apply one pushed position update. Updates are serialized by the
    /// caller: each is applied atomically against current state.
    ///
    /// Returns the proximity check whenever a trip is being tracked (from
    /// `AwaitingPayment` onward) and `None` otherwise; a chatty feed is
    /// absorbed, never an error. While `Navigating`, a check inside the
    /// arrival threshold advances to `Arrived` exactly once; the state
    /// itself is the latch against duplicate arrival events.
    pub fn position_update(
        &mut self,
        update: PositionUpdate,
    ) -> Result<Option<ArrivalCheck>, CoreError> {
        let destination = match self.state {
            TripState::AwaitingPayment
            | TripState::Paid
            | TripState::Navigating
            | TripState::Arrived => match self.session.current_trip() {
                Some(trip) => trip.destination_location,
                None => return Ok(None),
            },
            TripState::Searching | TripState::RoutePreview => return Ok(None),
        };

        let check = arrival::check(update.position, destination, self.arrival_threshold_m)?;
        self.last_position = Some(update);

        if self.state == TripState::Navigating && check.has_arrived {
            self.session.stop_navigating();
            self.stop_tracking_if_live();
            self.transition(TripState::Arrived);
        }
        Ok(Some(check))
    }

    /// Finish the trip after arrival: clears the record and returns to
    /// searching, ready for the next trip.
    pub fn finish_trip(&mut self) -> Result<(), CoreError> {
        self.expect_state(TripState::Arrived, "finish_trip")?;
        self.session.clear_trip();
        self.session.stop_navigating();
        self.stop_tracking_if_live();
        self.receipt = None;
        self.last_position = None;
        self.transition(TripState::Searching);
        Ok(())
    }

    /// Step back per the fixed back-map: payment states return to the
    /// preview (trip record retained), the preview returns to searching
    /// (record cleared).
    pub fn go_back(&mut self) -> Result<(), CoreError> {
        match self.state {
            TripState::AwaitingPayment => {
                self.stop_tracking_if_live();
                self.transition(TripState::RoutePreview);
                Ok(())
            }
            TripState::Paid | TripState::Navigating => {
                self.session.stop_navigating();
                self.stop_tracking_if_live();
                self.receipt = None;
                self.transition(TripState::RoutePreview);
                Ok(())
            }
            TripState::RoutePreview => {
                self.session.clear_trip();
                self.transition(TripState::Searching);
                Ok(())
            }
            TripState::Searching | TripState::Arrived => Err(CoreError::InvalidTransition {
                state: self.state,
                operation: "go_back",
            }),
        }
    }

    /// Tear the flow down to `Searching` from any state, clearing the trip
    /// and releasing the tracking subscription. Idempotent.
    pub fn reset(&mut self) {
        self.session.clear_trip();
        self.session.stop_navigating();
        self.stop_tracking_if_live();
        self.receipt = None;
        self.last_position = None;
        if self.state != TripState::Searching {
            self.transition(TripState::Searching);
        }
    }

    fn expect_state(&self, expected: TripState, operation: &'static str) -> Result<(), CoreError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                state: self.state,
                operation,
            })
        }
    }

    fn transition(&mut self, to: TripState) {
        debug!(from = ?self.state, to = ?to, "trip state transition");
        self.state = to;
    }

    fn stop_tracking_if_live(&mut self) {
        if self.tracking_live {
            self.effects.push_back(EffectRequest::StopLiveTracking);
            self.tracking_live = false;
        }
    }
}

/// Receipt reference: 8 uppercase alphanumerics, e.g. `"TXN-4F7K2QX9"`.
fn receipt_reference() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("TXN-{}", suffix.to_uppercase())
}


#[cfg(test)]
mod end_to_end_tests {
    use super::*;
    use crate::test_helpers::{coordinate_meters_north, market_area, san_pedro};
    use crate::tracking::{PositionFeed, ScriptedPositionFeed};

    #[test]
    fn rides_one_trip_end_to_end() {
        let mut flow = TripFlow::new();

        // Search: pick Market Area from the current San Pedro position.
        let trip = flow
            .select_destination(
                Some(san_pedro()),
                "Market Area",
                market_area(),
                TransportMeta::jeepney("Market Area"),
            )
            .expect("select destination");
        assert!(trip.distance_km > 4.0);
        assert_eq!(trip.fare.gross_fare, 15.0);
        let destination = trip.destination_location;

        // Preview -> payment.
        flow.start_route().expect("start route");
        assert_eq!(flow.next_effect(), Some(EffectRequest::BeginLiveTracking));

        let receipt = flow.pay(PaymentMethod::GCash).expect("pay").clone();
        assert_eq!(receipt.fare.net_display(), "₱15.00");

        flow.proceed_to_navigation().expect("proceed");
        assert_eq!(flow.state(), TripState::Navigating);

        // Live feed closes in on the destination.
        let mut feed = ScriptedPositionFeed::new([
            PositionUpdate {
                position: coordinate_meters_north(destination, 1500.0),
                timestamp_ms: 1_000,
            },
            PositionUpdate {
                position: coordinate_meters_north(destination, 400.0),
                timestamp_ms: 2_000,
            },
            PositionUpdate {
                position: coordinate_meters_north(destination, 30.0),
                timestamp_ms: 3_000,
            },
        ]);

        let mut displays = Vec::new();
        while let Some(update) = feed.next_update() {
            if let Some(check) = flow.position_update(update).expect("update") {
                displays.push(check.distance_display());
            }
            if flow.state() == TripState::Arrived {
                feed.stop();
            }
        }

        assert_eq!(displays, ["1.5 KM", "400 M", "30 M"]);
        assert_eq!(flow.state(), TripState::Arrived);
        assert!(feed.is_stopped());
        assert_eq!(flow.next_effect(), Some(EffectRequest::StopLiveTracking));

        // Finish: back to searching, record destroyed, ready for a new trip.
        flow.finish_trip().expect("finish");
        assert_eq!(flow.state(), TripState::Searching);
        assert!(flow.session().current_trip().is_none());
        assert!(flow.receipt().is_none());
    }
}
