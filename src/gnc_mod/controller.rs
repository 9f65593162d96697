use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::physics::RigidBody;
use super::guidance::GuidanceEvent;

/// Orders a controller accepts; mirrors the guidance command surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Idle,
    TurnTowards { target: Vector2<f64> },
    Seek { target: Vector2<f64> },
    FollowPath { waypoints: Vec<Vector2<f64>> },
    /// Retarget without a state change.
    SetTarget { target: Vector2<f64> },
}

impl Command {
    /// Orders whose target should follow a moving target every tick.
    pub fn tracks_target(&self) -> bool {
        matches!(self, Command::TurnTowards { .. } | Command::Seek { .. })
    }
}

/// Trait for steering controllers.
///
/// Implement this to plug a custom controller into the simulation loop.
/// `update` is called once per tick, before the physics step.
pub trait Controller {
    fn command(&mut self, body: &mut dyn RigidBody, command: Command);

    /// Apply this tick's forces and torques to the body.
    fn update(&mut self, body: &mut dyn RigidBody);

    /// Reset controller internal state (e.g., PID histories).
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }

    /// Point currently being steered toward, if any.
    fn target(&self) -> Option<Vector2<f64>> {
        None
    }

    fn drain_events(&mut self) -> Vec<GuidanceEvent> {
        Vec::new()
    }
}
