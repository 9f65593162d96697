use serde::{Deserialize, Serialize};

use crate::error::{GuidanceError, Result};
use super::history::SignalHistory;

// ---------------------------------------------------------------------------
// PID Controller (single axis, bounded history)
// ---------------------------------------------------------------------------

/// Samples required before the controller produces a non-zero output.
pub const MIN_SAMPLES: usize = 3;
pub const DEFAULT_MAX_HISTORY: usize = 7;
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 100.0;
/// Timesteps at or below this are rejected.
pub const MIN_TIME_STEP: f64 = 100.0 * f64::EPSILON;

/// Controller gains. `kplant` scales the summed P+I+D terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    #[serde(default = "unit_plant")]
    pub kplant: f64,
}

fn unit_plant() -> f64 {
    1.0
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd, kplant: 1.0 }
    }

    pub fn with_plant(mut self, kplant: f64) -> Self {
        self.kplant = kplant;
        self
    }

    /// Turn controller tuning for a nose-steered body.
    pub const TURN: PidGains = PidGains::new(2.0, 0.1, 5.0);
    /// Per-axis position thrust controllers.
    pub const THRUST: PidGains = PidGains::new(0.5, 0.05, 5.0);
}

impl Default for PidGains {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Discrete PID controller over a bounded window of error samples.
///
/// The integral term is Simpson's composite rule over the whole retained
/// window, so it forgets errors older than `max_history` samples instead of
/// accumulating without bound.
#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    dt: f64,
    errors: SignalHistory,
    outputs: SignalHistory,
}

impl Pid {
    pub fn new() -> Self {
        Self {
            gains: PidGains::default(),
            dt: DEFAULT_TIME_STEP,
            errors: SignalHistory::new(DEFAULT_MAX_HISTORY),
            outputs: SignalHistory::new(DEFAULT_MAX_HISTORY),
        }
    }

    pub fn with_gains(gains: PidGains) -> Self {
        let mut pid = Self::new();
        pid.gains = gains;
        pid
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn set_kp(&mut self, kp: f64) {
        self.gains.kp = kp;
    }

    pub fn set_ki(&mut self, ki: f64) {
        self.gains.ki = ki;
    }

    pub fn set_kd(&mut self, kd: f64) {
        self.gains.kd = kd;
    }

    pub fn set_kplant(&mut self, kplant: f64) {
        self.gains.kplant = kplant;
    }

    pub fn time_step(&self) -> f64 {
        self.dt
    }

    pub fn set_time_step(&mut self, dt: f64) -> Result<()> {
        if !dt.is_finite() || dt <= MIN_TIME_STEP {
            return Err(GuidanceError::InvalidTimeStep(dt));
        }
        self.dt = dt;
        Ok(())
    }

    pub fn max_history(&self) -> usize {
        self.errors.max_len()
    }

    pub fn set_max_history(&mut self, max_history: usize) -> Result<()> {
        if max_history < MIN_SAMPLES {
            return Err(GuidanceError::InvalidMaxHistory {
                requested: max_history,
                minimum: MIN_SAMPLES,
            });
        }
        self.errors.set_max_len(max_history);
        self.outputs.set_max_len(max_history);
        Ok(())
    }

    /// Feed a measurement against its set point; returns the new output.
    pub fn add_sample(&mut self, measured: f64, desired: f64) -> f64 {
        self.add_error(desired - measured)
    }

    /// Feed a pre-computed error; returns the new output.
    pub fn add_error(&mut self, error: f64) -> f64 {
        self.errors.push(error);
        let output = self.compute_output();
        self.outputs.push(output);
        output
    }

    fn compute_output(&self) -> f64 {
        let n = self.errors.len();
        if n < MIN_SAMPLES {
            return 0.0;
        }
        let PidGains { kp, ki, kd, kplant } = self.gains;

        let proportional = kp * self.errors.last();

        // Extended Simpson's rule: 1, 4, 2, 4, ..., 2, 4, 1
        let simpson: f64 = self
            .errors
            .iter()
            .enumerate()
            .map(|(idx, e)| {
                if idx == 0 || idx == n - 1 {
                    e
                } else if idx % 2 == 1 {
                    4.0 * e
                } else {
                    2.0 * e
                }
            })
            .sum();
        let integral = ki * simpson / (3.0 * self.dt);

        let derivative = kd * (self.errors.last() - self.errors.second_last()) / self.dt;

        kplant * (proportional + integral + derivative)
    }

    pub fn last_error(&self) -> f64 {
        self.errors.last()
    }

    pub fn last_output(&self) -> f64 {
        self.outputs.last()
    }

    /// True once enough samples have been seen to produce output.
    pub fn is_warmed_up(&self) -> bool {
        self.errors.len() >= MIN_SAMPLES
    }

    pub fn errors(&self) -> &SignalHistory {
        &self.errors
    }

    pub fn outputs(&self) -> &SignalHistory {
        &self.outputs
    }

    /// Linear one-step extrapolation of the output history.
    pub fn extrapolate_output(&self) -> f64 {
        if self.outputs.len() < 2 {
            return self.outputs.last();
        }
        let y0 = self.outputs.second_last();
        let y1 = self.outputs.last();
        // line through (-dt, y0) and (0, y1), evaluated at +dt
        let slope = (y1 - y0) / self.dt;
        y1 + slope * self.dt
    }

    pub fn reset_history(&mut self) {
        self.errors.clear();
        self.outputs.clear();
    }

    pub fn reset_constants(&mut self) {
        self.gains = PidGains::default();
    }
}

impl Default for Pid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pid(kp: f64, ki: f64, kd: f64, dt: f64) -> Pid {
        let mut pid = Pid::with_gains(PidGains::new(kp, ki, kd));
        pid.set_time_step(dt).unwrap();
        pid
    }

    #[test]
    fn pid_defaults() {
        let pid = Pid::new();
        assert_eq!(pid.gains(), PidGains { kp: 0.0, ki: 0.0, kd: 0.0, kplant: 1.0 });
        assert_eq!(pid.time_step(), DEFAULT_TIME_STEP);
        assert_eq!(pid.max_history(), DEFAULT_MAX_HISTORY);
        assert_eq!(pid.last_output(), 0.0);
        assert_eq!(pid.last_error(), 0.0);
    }

    #[test]
    fn pid_zero_during_warm_up() {
        let mut pid = pid(3.0, 1.0, 2.0, 0.01);
        assert_eq!(pid.add_sample(0.0, 5.0), 0.0);
        assert_eq!(pid.add_sample(0.0, 7.0), 0.0);
        assert_eq!(pid.last_output(), 0.0);
        assert_eq!(pid.last_error(), 7.0);
        assert!(!pid.is_warmed_up());
        pid.add_sample(0.0, 7.0);
        assert!(pid.is_warmed_up());
        assert!(pid.last_output() != 0.0);
    }

    #[test]
    fn pid_proportional() {
        let mut pid = pid(1.0, 0.0, 0.0, 0.01);
        for _ in 0..3 {
            pid.add_sample(0.0, 1.0);
        }
        assert_eq!(pid.last_output(), 1.0, "Pure P should output Kp * error");
    }

    #[test]
    fn pid_derivative_is_backward_difference() {
        let mut pid = pid(0.0, 0.0, 2.0, 0.1);
        pid.add_error(1.0);
        pid.add_error(1.0);
        let out = pid.add_error(1.5);
        assert_relative_eq!(out, 2.0 * 0.5 / 0.1, epsilon = 1e-12);
    }

    #[test]
    fn pid_integral_uses_simpson_weights() {
        let mut pid = pid(0.0, 1.0, 0.0, 0.5);
        let errs = [1.0, 2.0, 3.0, 4.0, 5.0];
        for e in errs {
            pid.add_error(e);
        }
        // 1*1 + 4*2 + 2*3 + 4*4 + 1*5 = 36, divided by 3*dt = 1.5
        assert_relative_eq!(pid.last_output(), 36.0 / 1.5, epsilon = 1e-12);
    }

    #[test]
    fn pid_integral_window_is_bounded() {
        let mut pid = pid(0.0, 1.0, 0.0, 1.0);
        for _ in 0..50 {
            pid.add_error(1.0);
        }
        // 7 samples: 1 + 4 + 2 + 4 + 2 + 4 + 1 = 18, / 3
        assert_relative_eq!(pid.last_output(), 6.0, epsilon = 1e-12);
        assert_eq!(pid.errors().len(), 7);
        assert_eq!(pid.outputs().len(), 7);
    }

    #[test]
    fn pid_plant_scales_output() {
        let mut pid = pid(2.0, 0.0, 0.0, 0.01);
        pid.set_kplant(0.5);
        for _ in 0..3 {
            pid.add_error(3.0);
        }
        assert_relative_eq!(pid.last_output(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn pid_history_eviction_keeps_last_pushes() {
        let mut pid = Pid::new();
        pid.set_max_history(4).unwrap();
        for i in 0..10 {
            pid.add_error(i as f64);
        }
        assert_eq!(pid.errors().to_vec(), vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn pid_rejects_bad_configuration() {
        let mut pid = Pid::new();
        assert!(matches!(pid.set_time_step(0.0), Err(GuidanceError::InvalidTimeStep(_))));
        assert!(pid.set_time_step(f64::EPSILON).is_err());
        assert!(pid.set_time_step(f64::NAN).is_err());
        assert_eq!(pid.time_step(), DEFAULT_TIME_STEP);
        assert!(matches!(
            pid.set_max_history(2),
            Err(GuidanceError::InvalidMaxHistory { requested: 2, minimum: 3 })
        ));
        assert!(pid.set_max_history(3).is_ok());
    }

    #[test]
    fn pid_reset_history_keeps_gains() {
        let mut pid = pid(1.0, 0.2, 0.3, 0.01);
        for _ in 0..5 {
            pid.add_error(1.0);
        }
        pid.reset_history();
        assert!(pid.errors().is_empty() && pid.outputs().is_empty());
        assert_eq!(pid.gains(), PidGains::new(1.0, 0.2, 0.3));
        pid.reset_constants();
        assert_eq!(pid.gains(), PidGains::default());
    }

    #[test]
    fn pid_extrapolates_linearly() {
        let mut pid = pid(1.0, 0.0, 0.0, 0.01);
        assert_eq!(pid.extrapolate_output(), 0.0);
        for e in [0.0, 0.0, 1.0, 2.0] {
            pid.add_error(e);
        }
        assert_relative_eq!(pid.extrapolate_output(), 3.0, epsilon = 1e-9);
    }
}
