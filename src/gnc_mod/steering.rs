use nalgebra::Vector2;
use tracing::debug;

use crate::error::Result;
use crate::math::{adjust_angle, heading_of, DEGENERATE_LENGTH_SQ};
use crate::physics::RigidBody;
use super::config::{GuidanceLimits, HeadingSource, ThrustLaw};
use super::pid::{Pid, PidGains};

// ---------------------------------------------------------------------------
// Turn law: PID on heading error, bounded angular acceleration
// ---------------------------------------------------------------------------

/// Speed below which the velocity vector is too noisy to steer by (m/s).
const MIN_STEERING_SPEED: f64 = 1e-3;

/// Result of one turn-law evaluation, kept for telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnSolution {
    /// heading - bearing, wrapped (rad). Positive means the target is clockwise.
    pub angle_error: f64,
    pub angular_acceleration: f64,
    pub torque: f64,
}

pub fn body_heading(body: &dyn RigidBody, source: HeadingSource) -> f64 {
    match source {
        HeadingSource::Nose => adjust_angle(body.angle()),
        HeadingSource::Velocity => {
            let vel = body.linear_velocity();
            if vel.norm() > MIN_STEERING_SPEED {
                heading_of(&vel).unwrap_or_else(|| adjust_angle(body.angle()))
            } else {
                adjust_angle(body.angle())
            }
        }
    }
}

/// Apply a bounded torque turning the body toward `target`.
///
/// Returns `None` without sampling the controller when the body sits on the
/// target, since no bearing exists.
pub(crate) fn apply_turn_torque(
    body: &mut dyn RigidBody,
    target: &Vector2<f64>,
    turn: &mut Pid,
    limits: &GuidanceLimits,
    source: HeadingSource,
) -> Option<TurnSolution> {
    let pos = body.position();
    let bearing = heading_of(&(target - pos))?;
    let heading = body_heading(body, source);
    let angle_error = adjust_angle(heading - bearing);

    // Negative feedback: positive error (nose left of target) must turn right.
    let output = -turn.add_error(angle_error);
    let max_acc = limits.max_angular_acceleration;
    let angular_acceleration = output.clamp(-max_acc, max_acc);

    let torque = angular_acceleration * body.inertia();
    body.apply_torque(torque);

    if let Some(max_omega) = limits.max_angular_velocity {
        let omega = body.angular_velocity();
        if omega.abs() > max_omega {
            body.set_angular_velocity(omega.clamp(-max_omega, max_omega));
        }
    }

    debug!(
        x = pos.x,
        y = pos.y,
        target_x = target.x,
        target_y = target.y,
        heading_deg = heading.to_degrees(),
        bearing_deg = bearing.to_degrees(),
        error = angle_error,
        ang_acc = angular_acceleration,
        omega_deg = body.angular_velocity().to_degrees(),
        "turn"
    );

    Some(TurnSolution { angle_error, angular_acceleration, torque })
}

// ---------------------------------------------------------------------------
// Thrust laws
// ---------------------------------------------------------------------------

/// Translational force source for Seek and FollowPath.
#[derive(Debug, Clone)]
pub enum ThrustController {
    VelocityMatch,
    PositionPid { x: Pid, y: Pid },
}

impl ThrustController {
    pub fn new(law: ThrustLaw, gains: PidGains, dt: f64, max_history: usize) -> Result<Self> {
        Ok(match law {
            ThrustLaw::VelocityMatch => ThrustController::VelocityMatch,
            ThrustLaw::PositionPid => {
                let mut x = Pid::with_gains(gains);
                x.set_time_step(dt)?;
                x.set_max_history(max_history)?;
                let y = x.clone();
                ThrustController::PositionPid { x, y }
            }
        })
    }

    pub fn law(&self) -> ThrustLaw {
        match self {
            ThrustController::VelocityMatch => ThrustLaw::VelocityMatch,
            ThrustController::PositionPid { .. } => ThrustLaw::PositionPid,
        }
    }

    /// Clear history and reload gains, as done on entering a thrusting state.
    pub fn setup(&mut self, gains: PidGains) {
        if let ThrustController::PositionPid { x, y } = self {
            for pid in [x, y] {
                pid.reset_history();
                pid.set_gains(gains);
            }
        }
    }

    pub fn reset(&mut self) {
        if let ThrustController::PositionPid { x, y } = self {
            x.reset_history();
            y.reset_history();
        }
    }

    /// Apply thrust toward `target`. Returns the force applied, or `None`
    /// when the body sits on the target.
    pub(crate) fn apply(
        &mut self,
        body: &mut dyn RigidBody,
        target: &Vector2<f64>,
        limits: &GuidanceLimits,
        dt: f64,
    ) -> Option<Vector2<f64>> {
        let to_target = target - body.position();
        if to_target.norm_squared() <= DEGENERATE_LENGTH_SQ {
            return None;
        }
        let vel = body.linear_velocity();
        let max_acc = limits.max_linear_acceleration;

        let accel = match self {
            ThrustController::VelocityMatch => {
                let desired = to_target.normalize() * limits.max_speed;
                let accel = (desired - vel) / dt;
                let magnitude = accel.norm();
                if magnitude > max_acc {
                    accel * (max_acc / magnitude)
                } else {
                    accel
                }
            }
            ThrustController::PositionPid { x, y } => {
                let ax = x.add_error(to_target.x).clamp(-max_acc, max_acc);
                let ay = y.add_error(to_target.y).clamp(-max_acc, max_acc);
                Vector2::new(ax, ay)
            }
        };

        let force = accel * body.mass();
        body.apply_force_to_center(force);
        debug!(speed = vel.norm(), fx = force.x, fy = force.y, "thrust");
        Some(force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Body, BodyDef, BodyShape};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn body_at_origin() -> Body {
        Body::new(&BodyDef::new(BodyShape::Circle { radius: 1.0 }))
    }

    fn warm_turn_pid(kp: f64) -> Pid {
        let mut pid = Pid::with_gains(PidGains::new(kp, 0.0, 0.0));
        pid.add_error(0.0);
        pid.add_error(0.0);
        pid
    }

    #[test]
    fn target_dead_ahead_gives_zero_error() {
        let mut body = body_at_origin();
        let mut pid = warm_turn_pid(1.0);
        let sol = apply_turn_torque(
            &mut body,
            &Vector2::new(50.0, 0.0),
            &mut pid,
            &GuidanceLimits::default(),
            HeadingSource::Nose,
        )
        .unwrap();
        assert_eq!(sol.angle_error, 0.0);
        assert_eq!(body.applied_torque(), 0.0);
    }

    #[test]
    fn turns_counter_clockwise_toward_left_target() {
        let mut body = body_at_origin();
        let mut pid = warm_turn_pid(1.0);
        let limits = GuidanceLimits { max_angular_acceleration: 100.0, ..GuidanceLimits::default() };
        let sol = apply_turn_torque(&mut body, &Vector2::new(0.0, 10.0), &mut pid, &limits, HeadingSource::Nose)
            .unwrap();
        assert_relative_eq!(sol.angle_error, -FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(sol.angular_acceleration, FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(body.applied_torque(), FRAC_PI_2 * body.inertia(), epsilon = 1e-12);
    }

    #[test]
    fn angular_acceleration_is_clamped() {
        let mut body = body_at_origin();
        let mut pid = warm_turn_pid(100.0);
        let limits = GuidanceLimits { max_angular_acceleration: 2.0, ..GuidanceLimits::default() };
        let sol = apply_turn_torque(&mut body, &Vector2::new(0.0, -10.0), &mut pid, &limits, HeadingSource::Nose)
            .unwrap();
        assert_eq!(sol.angular_acceleration, -2.0);
    }

    #[test]
    fn error_wraps_across_pi() {
        // Nose at +179 deg, target bearing at -179 deg: a 2 deg turn, not 358.
        let mut body = Body::new(&BodyDef::default().angle(179f64.to_radians()));
        let mut pid = warm_turn_pid(1.0);
        let target = Vector2::new((-179f64).to_radians().cos(), (-179f64).to_radians().sin()) * 20.0;
        let sol = apply_turn_torque(&mut body, &target, &mut pid, &GuidanceLimits::default(), HeadingSource::Nose)
            .unwrap();
        assert_relative_eq!(sol.angle_error, -2f64.to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn angular_velocity_cap_applies() {
        let mut body = body_at_origin();
        body.set_angular_velocity(5.0);
        let mut pid = warm_turn_pid(1.0);
        let limits = GuidanceLimits { max_angular_velocity: Some(1.0), ..GuidanceLimits::default() };
        apply_turn_torque(&mut body, &Vector2::new(10.0, 0.0), &mut pid, &limits, HeadingSource::Nose);
        assert_eq!(body.angular_velocity(), 1.0);
    }

    #[test]
    fn coincident_target_is_skipped() {
        let mut body = body_at_origin();
        let mut pid = Pid::new();
        assert!(apply_turn_torque(&mut body, &Vector2::zeros(), &mut pid, &GuidanceLimits::default(), HeadingSource::Nose)
            .is_none());
        assert!(pid.errors().is_empty());
        let mut thrust = ThrustController::VelocityMatch;
        assert!(thrust.apply(&mut body, &Vector2::zeros(), &GuidanceLimits::default(), 0.01).is_none());
    }

    #[test]
    fn velocity_heading_falls_back_to_nose() {
        let mut body = Body::new(&BodyDef::default().angle(1.0));
        assert_relative_eq!(body_heading(&body, HeadingSource::Velocity), 1.0, epsilon = 1e-12);
        body.set_linear_velocity(Vector2::new(0.0, -3.0));
        assert_relative_eq!(body_heading(&body, HeadingSource::Velocity), -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn velocity_match_is_bounded_and_points_at_target() {
        let mut body = body_at_origin();
        let limits = GuidanceLimits { max_linear_acceleration: 20.0, max_speed: 30.0, ..GuidanceLimits::default() };
        let mut thrust = ThrustController::VelocityMatch;
        let force = thrust.apply(&mut body, &Vector2::new(0.0, 100.0), &limits, 1.0 / 60.0).unwrap();
        assert_relative_eq!(force.norm(), 20.0 * body.mass(), epsilon = 1e-9);
        assert_relative_eq!(force.x, 0.0, epsilon = 1e-12);
        assert!(force.y > 0.0);
    }

    #[test]
    fn velocity_match_holds_cruise_speed() {
        let mut body = body_at_origin();
        body.set_linear_velocity(Vector2::new(30.0, 0.0));
        let limits = GuidanceLimits { max_speed: 30.0, ..GuidanceLimits::default() };
        let mut thrust = ThrustController::VelocityMatch;
        let force = thrust.apply(&mut body, &Vector2::new(500.0, 0.0), &limits, 0.01).unwrap();
        assert_relative_eq!(force.norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn position_pid_warms_up_before_thrusting() {
        let mut body = body_at_origin();
        let mut thrust = ThrustController::new(ThrustLaw::PositionPid, PidGains::THRUST, 0.01, 7).unwrap();
        let limits = GuidanceLimits::default();
        let target = Vector2::new(40.0, -40.0);
        for _ in 0..2 {
            assert_eq!(thrust.apply(&mut body, &target, &limits, 0.01), Some(Vector2::zeros()));
        }
        let force = thrust.apply(&mut body, &target, &limits, 0.01).unwrap();
        assert!(force.x > 0.0 && force.y < 0.0);
        assert!(force.x.abs() <= limits.max_linear_acceleration * body.mass() + 1e-9);
    }
}
