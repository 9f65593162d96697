use nalgebra::Vector2;

use missile_guidance::dynamics::state::SimConfig;
use missile_guidance::gnc::{Command, Controller};
use missile_guidance::math::{adjust_angle, bearing};
use missile_guidance::physics::RigidBody;
use missile_guidance::scenario::presets;
use missile_guidance::sim;

/// Bang-bang steering: full torque toward the switching line, full thrust
/// along the nose once it points within `aim_tolerance` of the target.
struct BangBangController {
    target: Option<Vector2<f64>>,
    max_torque: f64,
    thrust: f64,
    aim_tolerance: f64,
}

impl Controller for BangBangController {
    fn command(&mut self, body: &mut dyn RigidBody, command: Command) {
        self.target = match command {
            Command::Idle => None,
            Command::TurnTowards { target } | Command::Seek { target } | Command::SetTarget { target } => {
                Some(target)
            }
            Command::FollowPath { waypoints } => waypoints.first().copied(),
        };
        // some drag so constant thrust settles at a cruise speed
        body.set_linear_damping(0.4);
        body.set_angular_damping(0.0);
    }

    fn update(&mut self, body: &mut dyn RigidBody) {
        let Some(target) = self.target else { return };
        let Some(b) = bearing(&body.position(), &target) else { return };
        let error = adjust_angle(body.angle() - b);

        // switch on error plus a rate lead to avoid chattering
        let s = error + 0.5 * body.angular_velocity();
        body.apply_torque(-s.signum() * self.max_torque);

        if error.abs() < self.aim_tolerance {
            let force = body.forward() * self.thrust;
            body.apply_force_to_center(force);
        }
    }

    fn name(&self) -> &str {
        "BangBang"
    }

    fn target(&self) -> Option<Vector2<f64>> {
        self.target
    }
}

fn main() {
    let scenario = presets::crossing_target();
    let config = SimConfig { max_time: 60.0, ..SimConfig::default() };

    let mut controller = BangBangController {
        target: None,
        max_torque: 60.0,
        thrust: 400.0,
        aim_tolerance: 0.3,
    };

    println!("Simulating {} with {} controller...", scenario.name, controller.name());
    let record = match sim::simulate_with(&scenario, &config, &mut controller) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return;
        }
    };

    let max_speed = record.trajectory.iter().map(|s| s.speed()).fold(0.0_f64, f64::max);
    let closest = record
        .trajectory
        .iter()
        .zip(&record.targets)
        .filter_map(|(s, t)| t.map(|t| s.distance_to(&t)))
        .fold(f64::INFINITY, f64::min);

    match record.intercept() {
        Some(hit) => println!("Intercept at t={:.2} s", hit.time),
        None => println!("No intercept"),
    }
    println!("Closest approach: {:.1} m", closest);
    println!("Max speed: {:.1} m/s", max_speed);
    println!("Flight time: {:.1} s", record.final_state().map_or(0.0, |s| s.time));
    println!("Trajectory points: {}", record.trajectory.len());
}
