use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{GuidanceError, Result};
use crate::gnc::{Command, GuidanceConfig};
use crate::physics::BodyDef;
use crate::sim::target::TargetTrack;

// ---------------------------------------------------------------------------
// Scenario: missile, guidance tuning, initial order and target motion
// ---------------------------------------------------------------------------

fn default_intercept_radius() -> f64 {
    5.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub missile: BodyDef,
    #[serde(default)]
    pub guidance: GuidanceConfig,
    /// Issued once at t = 0.
    pub order: Command,
    /// Moving target. Seek/TurnTowards orders are retargeted onto it each tick.
    #[serde(default)]
    pub target: Option<TargetTrack>,
    #[serde(default = "default_intercept_radius")]
    pub intercept_radius: f64,
    #[serde(default)]
    pub stop_on_intercept: bool,
    /// Report when range to the target first closes below this (m).
    #[serde(default)]
    pub alert_range: Option<f64>,
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(GuidanceError::InvalidScenario(msg));

        if self.name.trim().is_empty() {
            return invalid("name must not be empty".into());
        }
        if !(self.missile.density.is_finite() && self.missile.density > 0.0) {
            return invalid(format!("missile density must be positive, got {}", self.missile.density));
        }
        if !(self.missile.mass() > 0.0 && self.missile.inertia() > 0.0) {
            return invalid("missile shape must have positive area".into());
        }
        if !(self.intercept_radius.is_finite() && self.intercept_radius >= 0.0) {
            return invalid(format!("intercept radius must be non-negative, got {}", self.intercept_radius));
        }
        if let Some(r) = self.alert_range {
            if !(r.is_finite() && r > 0.0) {
                return invalid(format!("alert range must be positive, got {r}"));
            }
        }
        let finite = |v: &Vector2<f64>| v.x.is_finite() && v.y.is_finite();
        let order_ok = match &self.order {
            Command::Idle => true,
            Command::TurnTowards { target } | Command::Seek { target } | Command::SetTarget { target } => {
                finite(target)
            }
            Command::FollowPath { waypoints } => waypoints.iter().all(finite),
        };
        if !order_ok {
            return invalid("order contains a non-finite position".into());
        }
        self.guidance.validate()
    }

    /// Initial order, retargeted onto the moving target when it tracks one.
    pub fn initial_order(&self) -> Command {
        match (&self.order, &self.target) {
            (Command::Seek { .. }, Some(track)) => Command::Seek { target: track.position_at(0.0) },
            (Command::TurnTowards { .. }, Some(track)) => {
                Command::TurnTowards { target: track.position_at(0.0) }
            }
            (order, _) => order.clone(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let scenario: Scenario = serde_json::from_reader(reader)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scenario builder
// ---------------------------------------------------------------------------

pub struct ScenarioBuilder {
    scenario: Scenario,
}

impl ScenarioBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scenario: Scenario {
                name: name.into(),
                missile: BodyDef::default(),
                guidance: GuidanceConfig::default(),
                order: Command::Idle,
                target: None,
                intercept_radius: default_intercept_radius(),
                stop_on_intercept: false,
                alert_range: None,
            },
        }
    }

    pub fn missile(mut self, v: BodyDef) -> Self { self.scenario.missile = v; self }
    pub fn guidance(mut self, v: GuidanceConfig) -> Self { self.scenario.guidance = v; self }
    pub fn order(mut self, v: Command) -> Self { self.scenario.order = v; self }
    pub fn target(mut self, v: TargetTrack) -> Self { self.scenario.target = Some(v); self }
    pub fn intercept_radius(mut self, v: f64) -> Self { self.scenario.intercept_radius = v; self }
    pub fn stop_on_intercept(mut self, v: bool) -> Self { self.scenario.stop_on_intercept = v; self }
    pub fn alert_range(mut self, v: f64) -> Self { self.scenario.alert_range = Some(v); self }

    pub fn build(self) -> Result<Scenario> {
        self.scenario.validate()?;
        Ok(self.scenario)
    }
}
