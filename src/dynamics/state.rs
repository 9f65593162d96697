use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::math::adjust_angle;
use crate::physics::{Body, RigidBody};

// ---------------------------------------------------------------------------
// Body snapshot: position, velocity, attitude, angular rate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    pub time: f64,
    pub pos: Vector2<f64>,       // m, world frame
    pub vel: Vector2<f64>,       // m/s
    pub angle: f64,              // rad, unbounded as integrated
    pub omega: f64,              // rad/s
}

impl BodyState {
    pub fn capture(time: f64, body: &dyn RigidBody) -> Self {
        Self {
            time,
            pos: body.position(),
            vel: body.linear_velocity(),
            angle: body.angle(),
            omega: body.angular_velocity(),
        }
    }

    pub fn speed(&self) -> f64 {
        self.vel.norm()
    }

    /// Heading wrapped into (-pi, pi].
    pub fn heading(&self) -> f64 {
        adjust_angle(self.angle)
    }

    pub fn distance_to(&self, point: &Vector2<f64>) -> f64 {
        (point - self.pos).norm()
    }
}

// ---------------------------------------------------------------------------
// Actuation applied by guidance during one tick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Actuation {
    pub force: Vector2<f64>,   // N, world frame, at centre of mass
    pub torque: f64,           // N·m
}

impl Actuation {
    /// Read the forces accumulated on a body before the world consumes them.
    pub fn pending(body: &Body) -> Self {
        Self { force: body.applied_force(), torque: body.applied_torque() }
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub dt: f64,
    pub max_time: f64,
    #[serde(default)]
    pub gravity: Vector2<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,            // fixed 60 Hz tick
            max_time: 30.0,
            gravity: Vector2::zeros(), // top-down arena
        }
    }
}
