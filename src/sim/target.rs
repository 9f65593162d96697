use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scripted target motion
// ---------------------------------------------------------------------------

/// Kinematic path of the point being chased. Time in seconds from start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetTrack {
    Stationary { position: Vector2<f64> },
    Linear { start: Vector2<f64>, velocity: Vector2<f64> },
    Circular {
        center: Vector2<f64>,
        radius: f64,
        /// rad/s, positive counter-clockwise
        angular_speed: f64,
        #[serde(default)]
        phase: f64,
    },
}

impl TargetTrack {
    pub fn position_at(&self, t: f64) -> Vector2<f64> {
        match *self {
            TargetTrack::Stationary { position } => position,
            TargetTrack::Linear { start, velocity } => start + velocity * t,
            TargetTrack::Circular { center, radius, angular_speed, phase } => {
                let a = phase + angular_speed * t;
                center + Vector2::new(a.cos(), a.sin()) * radius
            }
        }
    }
}
