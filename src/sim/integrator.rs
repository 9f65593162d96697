use nalgebra::Vector2;

use crate::physics::Body;

// ---------------------------------------------------------------------------
// Semi-implicit Euler step with accumulated force/torque held over the step
// ---------------------------------------------------------------------------

/// Advance one body by `dt`, consuming its force/torque accumulators.
///
/// Velocities are updated first and the new velocities move the body.
/// Damping follows Box2D: `v *= 1 / (1 + dt * c)`.
pub fn semi_implicit_euler(body: &mut Body, gravity: &Vector2<f64>, dt: f64) {
    if body.mass > 0.0 {
        let accel = gravity + body.force / body.mass;
        body.vel += accel * dt;
    }
    if body.inertia > 0.0 {
        body.omega += body.torque / body.inertia * dt;
    }

    body.vel *= 1.0 / (1.0 + dt * body.linear_damping);
    body.omega *= 1.0 / (1.0 + dt * body.angular_damping);

    body.pos += body.vel * dt;
    body.angle += body.omega * dt;

    body.clear_forces();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyDef, BodyShape, RigidBody};
    use approx::assert_relative_eq;

    fn unit_box() -> Body {
        // mass 1, inertia 1/6
        Body::new(&BodyDef::new(BodyShape::Box { half_width: 0.5, half_height: 0.5 }))
    }

    #[test]
    fn force_changes_velocity_then_position() {
        let mut body = unit_box();
        body.apply_force_to_center(Vector2::new(2.0, 0.0));
        semi_implicit_euler(&mut body, &Vector2::zeros(), 0.5);
        assert_relative_eq!(body.linear_velocity().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(body.position().x, 0.5, epsilon = 1e-12);
        assert_eq!(body.applied_force(), Vector2::zeros());
    }

    #[test]
    fn torque_spins_body() {
        let mut body = unit_box();
        body.apply_torque(1.0 / 6.0);
        semi_implicit_euler(&mut body, &Vector2::zeros(), 1.0);
        assert_relative_eq!(body.angular_velocity(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(body.angle(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn damping_bleeds_speed() {
        let mut body = unit_box();
        body.set_linear_velocity(Vector2::new(10.0, 0.0));
        body.set_linear_damping(1.0);
        semi_implicit_euler(&mut body, &Vector2::zeros(), 1.0);
        assert_relative_eq!(body.linear_velocity().x, 5.0, epsilon = 1e-12);
    }
}
