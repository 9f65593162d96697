use std::f64::consts::FRAC_PI_2;

use nalgebra::Vector2;

use crate::gnc::{Command, GuidanceConfig, GuidanceLimits, HeadingSource};
use crate::physics::{BodyDef, BodyShape};
use crate::sim::target::TargetTrack;
use super::engagement::Scenario;

/// 5 m x 2 m airframe, 10 kg.
pub fn missile_airframe() -> BodyDef {
    BodyDef::new(BodyShape::Box { half_width: 2.5, half_height: 1.0 }).density(1.0)
}

fn intercept_limits() -> GuidanceLimits {
    GuidanceLimits {
        min_arrival_distance: 4.0,
        ..GuidanceLimits::default()
    }
}

/// Target crossing left to right ahead of the launch point.
pub fn crossing_target() -> Scenario {
    Scenario {
        name: "Crossing Target".into(),
        missile: missile_airframe(),
        guidance: GuidanceConfig::default().with_limits(intercept_limits()),
        order: Command::Seek { target: Vector2::zeros() },
        target: Some(TargetTrack::Linear {
            start: Vector2::new(250.0, -150.0),
            velocity: Vector2::new(0.0, 20.0),
        }),
        intercept_radius: 5.0,
        stop_on_intercept: true,
        alert_range: Some(100.0),
    }
}

/// Target orbiting a fixed point; steering follows the velocity vector.
pub fn circling_target() -> Scenario {
    Scenario {
        name: "Circling Target".into(),
        missile: missile_airframe().position(Vector2::new(-200.0, 0.0)),
        guidance: GuidanceConfig::default()
            .with_limits(intercept_limits())
            .with_heading_source(HeadingSource::Velocity),
        order: Command::Seek { target: Vector2::zeros() },
        target: Some(TargetTrack::Circular {
            center: Vector2::new(100.0, 0.0),
            radius: 80.0,
            angular_speed: 0.3,
            phase: FRAC_PI_2,
        }),
        intercept_radius: 5.0,
        stop_on_intercept: true,
        alert_range: Some(100.0),
    }
}

/// Fly a square patrol and stop at the last corner.
pub fn waypoint_patrol() -> Scenario {
    Scenario {
        name: "Waypoint Patrol".into(),
        missile: missile_airframe(),
        guidance: GuidanceConfig::default().with_seeded_paths(true),
        order: Command::FollowPath {
            waypoints: vec![
                Vector2::new(150.0, 0.0),
                Vector2::new(150.0, 150.0),
                Vector2::new(0.0, 150.0),
                Vector2::new(0.0, 0.0),
            ],
        },
        target: None,
        intercept_radius: 5.0,
        stop_on_intercept: false,
        alert_range: None,
    }
}

/// Rotate in place to face a point abeam.
pub fn turn_in_place() -> Scenario {
    Scenario {
        name: "Turn In Place".into(),
        missile: missile_airframe(),
        guidance: GuidanceConfig::default(),
        order: Command::TurnTowards { target: Vector2::new(0.0, 100.0) },
        target: None,
        intercept_radius: 5.0,
        stop_on_intercept: false,
        alert_range: None,
    }
}

pub fn by_name(name: &str) -> Option<Scenario> {
    match name {
        "crossing" | "crossing_target" => Some(crossing_target()),
        "circling" | "circling_target" => Some(circling_target()),
        "patrol" | "waypoint_patrol" => Some(waypoint_patrol()),
        "turn" | "turn_in_place" => Some(turn_in_place()),
        _ => None,
    }
}

pub const NAMES: [&str; 4] = ["crossing", "circling", "patrol", "turn"];
