use std::f64::consts::PI;

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Body contract consumed by guidance
// ---------------------------------------------------------------------------

/// The narrow view of a rigid body that the guidance layer steers.
///
/// Forces and torques are accumulated and consumed by the next world step.
pub trait RigidBody {
    fn position(&self) -> Vector2<f64>;
    fn set_position(&mut self, position: Vector2<f64>);
    /// Orientation (rad), unbounded.
    fn angle(&self) -> f64;
    fn set_angle(&mut self, angle: f64);
    fn linear_velocity(&self) -> Vector2<f64>;
    fn set_linear_velocity(&mut self, velocity: Vector2<f64>);
    fn angular_velocity(&self) -> f64;
    fn set_angular_velocity(&mut self, omega: f64);
    fn mass(&self) -> f64;
    fn inertia(&self) -> f64;
    fn apply_torque(&mut self, torque: f64);
    fn apply_force_to_center(&mut self, force: Vector2<f64>);
    fn set_linear_damping(&mut self, damping: f64);
    fn set_angular_damping(&mut self, damping: f64);

    /// A body-local direction expressed in world coordinates.
    fn world_vector(&self, local: Vector2<f64>) -> Vector2<f64> {
        Rotation2::new(self.angle()) * local
    }

    /// Unit vector along the body's local +x axis (the nose).
    fn forward(&self) -> Vector2<f64> {
        self.world_vector(Vector2::x())
    }
}

// ---------------------------------------------------------------------------
// Body shape and definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyShape {
    Circle { radius: f64 },
    /// Rectangle centred on the body origin, long axis along +x.
    Box { half_width: f64, half_height: f64 },
}

impl BodyShape {
    pub fn area(&self) -> f64 {
        match *self {
            BodyShape::Circle { radius } => PI * radius * radius,
            BodyShape::Box { half_width, half_height } => 4.0 * half_width * half_height,
        }
    }

    /// Polar moment of inertia about the centre for unit mass.
    pub fn unit_inertia(&self) -> f64 {
        match *self {
            BodyShape::Circle { radius } => 0.5 * radius * radius,
            BodyShape::Box { half_width, half_height } => {
                let (w, h) = (2.0 * half_width, 2.0 * half_height);
                (w * w + h * h) / 12.0
            }
        }
    }
}

/// Initial conditions and mass properties of a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    pub position: Vector2<f64>,
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub linear_velocity: Vector2<f64>,
    #[serde(default)]
    pub angular_velocity: f64,
    pub shape: BodyShape,
    pub density: f64,
    #[serde(default)]
    pub linear_damping: f64,
    #[serde(default)]
    pub angular_damping: f64,
}

impl BodyDef {
    pub fn new(shape: BodyShape) -> Self {
        Self {
            position: Vector2::zeros(),
            angle: 0.0,
            linear_velocity: Vector2::zeros(),
            angular_velocity: 0.0,
            shape,
            density: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn position(mut self, v: Vector2<f64>) -> Self { self.position = v; self }
    pub fn angle(mut self, v: f64) -> Self { self.angle = v; self }
    pub fn linear_velocity(mut self, v: Vector2<f64>) -> Self { self.linear_velocity = v; self }
    pub fn angular_velocity(mut self, v: f64) -> Self { self.angular_velocity = v; self }
    pub fn density(mut self, v: f64) -> Self { self.density = v; self }
    pub fn linear_damping(mut self, v: f64) -> Self { self.linear_damping = v; self }
    pub fn angular_damping(mut self, v: f64) -> Self { self.angular_damping = v; self }

    pub fn mass(&self) -> f64 {
        self.shape.area() * self.density
    }

    pub fn inertia(&self) -> f64 {
        self.mass() * self.shape.unit_inertia()
    }
}

impl Default for BodyDef {
    fn default() -> Self {
        Self::new(BodyShape::Circle { radius: 1.0 })
    }
}

// ---------------------------------------------------------------------------
// Concrete body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) pos: Vector2<f64>,
    pub(crate) angle: f64,
    pub(crate) vel: Vector2<f64>,
    pub(crate) omega: f64,
    pub(crate) mass: f64,
    pub(crate) inertia: f64,
    pub(crate) linear_damping: f64,
    pub(crate) angular_damping: f64,
    pub(crate) force: Vector2<f64>,
    pub(crate) torque: f64,
    shape: BodyShape,
}

impl Body {
    pub fn new(def: &BodyDef) -> Self {
        Self {
            pos: def.position,
            angle: def.angle,
            vel: def.linear_velocity,
            omega: def.angular_velocity,
            mass: def.mass(),
            inertia: def.inertia(),
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            force: Vector2::zeros(),
            torque: 0.0,
            shape: def.shape,
        }
    }

    pub fn shape(&self) -> BodyShape {
        self.shape
    }

    /// Force accumulated since the last step.
    pub fn applied_force(&self) -> Vector2<f64> {
        self.force
    }

    /// Torque accumulated since the last step.
    pub fn applied_torque(&self) -> f64 {
        self.torque
    }

    pub fn clear_forces(&mut self) {
        self.force = Vector2::zeros();
        self.torque = 0.0;
    }
}

impl RigidBody for Body {
    fn position(&self) -> Vector2<f64> { self.pos }
    fn set_position(&mut self, position: Vector2<f64>) { self.pos = position; }
    fn angle(&self) -> f64 { self.angle }
    fn set_angle(&mut self, angle: f64) { self.angle = angle; }
    fn linear_velocity(&self) -> Vector2<f64> { self.vel }
    fn set_linear_velocity(&mut self, velocity: Vector2<f64>) { self.vel = velocity; }
    fn angular_velocity(&self) -> f64 { self.omega }
    fn set_angular_velocity(&mut self, omega: f64) { self.omega = omega; }
    fn mass(&self) -> f64 { self.mass }
    fn inertia(&self) -> f64 { self.inertia }

    fn apply_torque(&mut self, torque: f64) {
        self.torque += torque;
    }

    fn apply_force_to_center(&mut self, force: Vector2<f64>) {
        self.force += force;
    }

    fn set_linear_damping(&mut self, damping: f64) {
        self.linear_damping = damping;
    }

    fn set_angular_damping(&mut self, damping: f64) {
        self.angular_damping = damping;
    }
}
