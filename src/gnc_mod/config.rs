use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::{GuidanceError, Result};
use super::pid::{PidGains, DEFAULT_MAX_HISTORY, MIN_SAMPLES, MIN_TIME_STEP};

// ---------------------------------------------------------------------------
// Steering limits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuidanceLimits {
    pub max_angular_acceleration: f64, // rad/s^2
    pub max_linear_acceleration: f64,  // m/s^2
    pub min_arrival_distance: f64,     // m
    pub max_speed: f64,                // m/s
    /// Post-torque clamp on angular rate (rad/s). Off when `None`.
    #[serde(default)]
    pub max_angular_velocity: Option<f64>,
}

impl Default for GuidanceLimits {
    fn default() -> Self {
        Self {
            max_angular_acceleration: TAU,
            max_linear_acceleration: 100.0,
            min_arrival_distance: 10.0,
            max_speed: 50.0,
            max_angular_velocity: None,
        }
    }
}

impl GuidanceLimits {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("max_angular_acceleration", self.max_angular_acceleration),
            ("max_linear_acceleration", self.max_linear_acceleration),
            ("min_arrival_distance", self.min_arrival_distance),
            ("max_speed", self.max_speed),
            ("max_angular_velocity", self.max_angular_velocity.unwrap_or(0.0)),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(GuidanceError::InvalidLimit { name, value });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Steering policies
// ---------------------------------------------------------------------------

/// Which direction counts as the body's heading when computing turn error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingSource {
    /// Body orientation (nose).
    #[default]
    Nose,
    /// Direction of travel; falls back to the nose when nearly stationary.
    Velocity,
}

/// How translational force is produced in Seek and FollowPath.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrustLaw {
    /// Steer the velocity toward `max_speed` along the line to the target.
    #[default]
    VelocityMatch,
    /// Independent x/y PID controllers on the position error.
    PositionPid,
}

// ---------------------------------------------------------------------------
// Guidance configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    /// Controller timestep; also the tick used by the velocity-matching law.
    pub dt: f64,
    pub max_history: usize,
    pub turn_gains: PidGains,
    pub thrust_gains: PidGains,
    pub limits: GuidanceLimits,
    pub heading_source: HeadingSource,
    pub thrust_law: ThrustLaw,
    /// Push the body's own position onto the front of a new path.
    pub seed_path_with_position: bool,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            max_history: DEFAULT_MAX_HISTORY,
            turn_gains: PidGains::TURN,
            thrust_gains: PidGains::THRUST,
            limits: GuidanceLimits::default(),
            heading_source: HeadingSource::default(),
            thrust_law: ThrustLaw::default(),
            seed_path_with_position: false,
        }
    }
}

impl GuidanceConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= MIN_TIME_STEP {
            return Err(GuidanceError::InvalidTimeStep(self.dt));
        }
        if self.max_history < MIN_SAMPLES {
            return Err(GuidanceError::InvalidMaxHistory {
                requested: self.max_history,
                minimum: MIN_SAMPLES,
            });
        }
        self.limits.validate()
    }

    pub fn with_limits(mut self, limits: GuidanceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_turn_gains(mut self, gains: PidGains) -> Self {
        self.turn_gains = gains;
        self
    }

    pub fn with_thrust_gains(mut self, gains: PidGains) -> Self {
        self.thrust_gains = gains;
        self
    }

    pub fn with_heading_source(mut self, source: HeadingSource) -> Self {
        self.heading_source = source;
        self
    }

    pub fn with_thrust_law(mut self, law: ThrustLaw) -> Self {
        self.thrust_law = law;
        self
    }

    pub fn with_seeded_paths(mut self, seed: bool) -> Self {
        self.seed_path_with_position = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GuidanceConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_timestep_and_history() {
        let c = GuidanceConfig::default().with_dt(0.0);
        assert!(matches!(c.validate(), Err(GuidanceError::InvalidTimeStep(_))));
        let c = GuidanceConfig { max_history: 2, ..GuidanceConfig::default() };
        assert!(matches!(c.validate(), Err(GuidanceError::InvalidMaxHistory { .. })));
    }

    #[test]
    fn rejects_negative_or_nan_limits() {
        let limits = GuidanceLimits { max_speed: -1.0, ..GuidanceLimits::default() };
        assert!(matches!(
            limits.validate(),
            Err(GuidanceError::InvalidLimit { name: "max_speed", .. })
        ));
        let limits = GuidanceLimits { max_angular_velocity: Some(f64::NAN), ..GuidanceLimits::default() };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: GuidanceConfig = serde_json::from_str(r#"{ "thrust_law": "position_pid" }"#).unwrap();
        assert_eq!(c.thrust_law, ThrustLaw::PositionPid);
        assert_eq!(c.max_history, DEFAULT_MAX_HISTORY);
        assert_eq!(c.turn_gains, PidGains::TURN);
    }
}
