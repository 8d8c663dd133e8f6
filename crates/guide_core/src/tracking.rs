//! Live-position feed boundary.
//!
//! The core never polls a location service: updates are pushed in and applied
//! one at a time through [`crate::flow::TripFlow::position_update`]. A feed
//! must support an explicit stop so position callbacks are not leaked when a
//! trip ends or the session is torn down.

use std::collections::VecDeque;

use crate::geo::Coordinate;

/// One pushed location event from the device feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionUpdate {
    pub position: Coordinate,
    pub timestamp_ms: u64,
}

/// A source of pushed position updates.
///
/// Real implementations wrap a device location service and start/stop in
/// response to the trip flow's `BeginLiveTracking` / `StopLiveTracking`
/// effect requests. `stop` must be idempotent.
pub trait PositionFeed {
    /// Next pending update, if any. A stopped feed yields nothing.
    fn next_update(&mut self) -> Option<PositionUpdate>;

    /// Stop delivering updates and release the underlying subscription.
    fn stop(&mut self);
}

/// A queue-backed feed with pre-scripted updates, for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPositionFeed {
    updates: VecDeque<PositionUpdate>,
    stopped: bool,
}

impl ScriptedPositionFeed {
    pub fn new(updates: impl IntoIterator<Item = PositionUpdate>) -> Self {
        Self {
            updates: updates.into_iter().collect(),
            stopped: false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl PositionFeed for ScriptedPositionFeed {
    fn next_update(&mut self) -> Option<PositionUpdate> {
        if self.stopped {
            return None;
        }
        self.updates.pop_front()
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.updates.clear();
    }
}
