use nalgebra::Vector2;

use crate::dynamics::state::BodyState;
use crate::gnc::{GuidanceEvent, GuidanceState};

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    StateChanged { from: GuidanceState, to: GuidanceState },
    WaypointReached { waypoint: Vector2<f64>, remaining: usize },
    Arrived,
    PathCompleted,
    Intercept { miss_distance: f64 },
    Custom(String),
}

impl From<GuidanceEvent> for EventKind {
    fn from(e: GuidanceEvent) -> Self {
        match e {
            GuidanceEvent::StateChanged { from, to } => EventKind::StateChanged { from, to },
            GuidanceEvent::WaypointReached { waypoint, remaining } => {
                EventKind::WaypointReached { waypoint, remaining }
            }
            GuidanceEvent::Arrived { .. } => EventKind::Arrived,
            GuidanceEvent::PathCompleted => EventKind::PathCompleted,
        }
    }
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub state: BodyState,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive states against the target position.
pub trait EventDetector {
    fn check(&mut self, prev: &BodyState, current: &BodyState, target: &Vector2<f64>) -> Option<EventKind>;
}

/// Fires once when the body comes within `radius` of the target.
pub struct InterceptDetector {
    pub radius: f64,
    fired: bool,
}

impl InterceptDetector {
    pub fn new(radius: f64) -> Self {
        Self { radius, fired: false }
    }
}

impl EventDetector for InterceptDetector {
    fn check(&mut self, _prev: &BodyState, current: &BodyState, target: &Vector2<f64>) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        let miss_distance = current.distance_to(target);
        if miss_distance <= self.radius {
            self.fired = true;
            Some(EventKind::Intercept { miss_distance })
        } else {
            None
        }
    }
}

/// Detects when range to target crosses a threshold (closing or opening).
pub struct RangeDetector {
    pub range: f64,
    pub closing: bool,
    fired: bool,
}

impl RangeDetector {
    pub fn new(range: f64, closing: bool) -> Self {
        Self { range, closing, fired: false }
    }
}

impl EventDetector for RangeDetector {
    fn check(&mut self, prev: &BodyState, current: &BodyState, target: &Vector2<f64>) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        let (r0, r1) = (prev.distance_to(target), current.distance_to(target));
        let crossed = if self.closing {
            r0 > self.range && r1 <= self.range
        } else {
            r0 < self.range && r1 >= self.range
        };
        if crossed {
            self.fired = true;
            Some(EventKind::Custom(format!(
                "Range {:.0}m ({})",
                self.range,
                if self.closing { "closing" } else { "opening" }
            )))
        } else {
            None
        }
    }
}
