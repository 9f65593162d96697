use std::f64::consts::{PI, TAU};

use nalgebra::Vector2;

// ---------------------------------------------------------------------------
// Angle wrapping
// ---------------------------------------------------------------------------

/// Squared length below which a direction vector is considered degenerate.
pub const DEGENERATE_LENGTH_SQ: f64 = 1e-12;

/// Wrap an angle (rad) into (-pi, pi].
///
/// Physics bodies accumulate angle without bound, so both the heading and the
/// bearing are passed through here before they are differenced, and the
/// difference is wrapped again.
pub fn adjust_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let mut a = angle % TAU;
    while a > PI {
        a -= TAU;
    }
    while a <= -PI {
        a += TAU;
    }
    a
}

/// Angle as a fraction of pi, in (-1, 1].
pub fn normalized_angle(angle: f64) -> f64 {
    adjust_angle(angle) / PI
}

/// Direction of a vector (rad, wrapped). `None` for a zero-length vector.
pub fn heading_of(v: &Vector2<f64>) -> Option<f64> {
    if v.norm_squared() <= DEGENERATE_LENGTH_SQ {
        None
    } else {
        Some(adjust_angle(v.y.atan2(v.x)))
    }
}

/// Bearing from one point to another (rad, wrapped).
/// `None` when the points coincide.
pub fn bearing(from: &Vector2<f64>, to: &Vector2<f64>) -> Option<f64> {
    heading_of(&(to - from))
}
