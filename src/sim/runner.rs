use nalgebra::Vector2;
use tracing::{debug, info};

use crate::dynamics::state::{Actuation, BodyState, SimConfig};
use crate::error::{GuidanceError, Result};
use crate::gnc::{Command, Controller, Guidance};
use crate::physics::{BodyHandle, World};
use crate::scenario::Scenario;
use super::event::{EventDetector, EventKind, InterceptDetector, RangeDetector, SimEvent};

// ---------------------------------------------------------------------------
// Recorded engagement
// ---------------------------------------------------------------------------

/// Per-tick record of a run. `trajectory`, `targets` and `actuations` are
/// index-aligned; entry 0 is the initial state.
#[derive(Debug, Clone, Default)]
pub struct SimRecord {
    pub trajectory: Vec<BodyState>,
    /// Point being chased at each sample, if any.
    pub targets: Vec<Option<Vector2<f64>>>,
    /// Force/torque applied during the tick that ended at this sample.
    pub actuations: Vec<Actuation>,
    pub events: Vec<SimEvent>,
}

impl SimRecord {
    pub fn intercept(&self) -> Option<&SimEvent> {
        self.events
            .iter()
            .find(|e| matches!(e.kind, EventKind::Intercept { .. }))
    }

    pub fn final_state(&self) -> Option<&BodyState> {
        self.trajectory.last()
    }
}

fn validate_config(config: &SimConfig) -> Result<()> {
    if !(config.dt.is_finite() && config.dt > 0.0) {
        return Err(GuidanceError::InvalidScenario(format!("sim dt must be positive, got {}", config.dt)));
    }
    if !(config.max_time.is_finite() && config.max_time >= 0.0) {
        return Err(GuidanceError::InvalidScenario(format!(
            "max_time must be non-negative, got {}",
            config.max_time
        )));
    }
    Ok(())
}

/// Scripted target position, else whatever the controller is chasing.
fn target_at(scenario: &Scenario, t: f64, controller: &dyn Controller) -> Option<Vector2<f64>> {
    match &scenario.target {
        Some(track) => Some(track.position_at(t)),
        None => controller.target(),
    }
}

fn snapshot(world: &World, handle: BodyHandle, time: f64) -> Result<BodyState> {
    let body = world.body(handle).ok_or_else(|| handle.stale())?;
    Ok(BodyState::capture(time, body))
}

// ---------------------------------------------------------------------------
// Full engagement simulation
// ---------------------------------------------------------------------------

/// Simulate a scenario with a custom controller.
///
/// Each tick: move the target, retarget tracking orders, run the controller,
/// then step the world. Stops at `max_time`, on intercept when the scenario
/// asks for it, or when a path is completed.
pub fn simulate_with(
    scenario: &Scenario,
    config: &SimConfig,
    controller: &mut dyn Controller,
) -> Result<SimRecord> {
    scenario.validate()?;
    validate_config(config)?;

    let mut world = World::new(config.gravity);
    let handle = world.create_body(&scenario.missile);
    let tracks_target = scenario.order.tracks_target();

    let mut detectors: Vec<Box<dyn EventDetector>> =
        vec![Box::new(InterceptDetector::new(scenario.intercept_radius))];
    if let Some(range) = scenario.alert_range {
        detectors.push(Box::new(RangeDetector::new(range, true)));
    }

    // Tolerate round-off so 1 s at 60 Hz is 60 ticks, not 61
    let steps = (config.max_time / config.dt - 1e-9).ceil().max(0.0) as usize;
    let cap = (steps + 1).min(200_000);
    let mut record = SimRecord {
        trajectory: Vec::with_capacity(cap),
        targets: Vec::with_capacity(cap),
        actuations: Vec::with_capacity(cap),
        events: Vec::new(),
    };

    info!(scenario = %scenario.name, controller = controller.name(), "engagement start");
    {
        let body = world.body_mut(handle).ok_or_else(|| handle.stale())?;
        controller.command(body, scenario.initial_order());
    }
    let mut prev = snapshot(&world, handle, 0.0)?;
    for e in controller.drain_events() {
        record.events.push(SimEvent { time: 0.0, kind: e.into(), state: prev.clone() });
    }
    record.trajectory.push(prev.clone());
    record.targets.push(target_at(scenario, 0.0, controller));
    record.actuations.push(Actuation::default());

    for step in 0..steps {
        let t = step as f64 * config.dt;

        // GNC update, ahead of the physics step that consumes its forces
        let actuation = {
            let body = world.body_mut(handle).ok_or_else(|| handle.stale())?;
            if tracks_target {
                if let Some(track) = &scenario.target {
                    controller.command(body, Command::SetTarget { target: track.position_at(t) });
                }
            }
            controller.update(body);
            Actuation::pending(body)
        };

        world.step(config.dt);

        let time = (step + 1) as f64 * config.dt;
        let current = snapshot(&world, handle, time)?;
        let target = target_at(scenario, time, controller);

        let mut stop = false;
        for e in controller.drain_events() {
            let kind = EventKind::from(e);
            stop |= kind == EventKind::PathCompleted;
            record.events.push(SimEvent { time, kind, state: current.clone() });
        }
        if let Some(target) = &target {
            for detector in detectors.iter_mut() {
                if let Some(kind) = detector.check(&prev, &current, target) {
                    info!(time, ?kind, "event");
                    stop |= scenario.stop_on_intercept && matches!(kind, EventKind::Intercept { .. });
                    record.events.push(SimEvent { time, kind, state: current.clone() });
                }
            }
        }

        debug!(time, x = current.pos.x, y = current.pos.y, speed = current.speed(), "tick");
        record.trajectory.push(current.clone());
        record.targets.push(target);
        record.actuations.push(actuation);
        prev = current;

        if stop {
            break;
        }
    }

    info!(
        scenario = %scenario.name,
        steps = record.trajectory.len() - 1,
        intercept = record.intercept().is_some(),
        "engagement end"
    );
    Ok(record)
}

/// Simulate with the scenario's own guidance configuration. The guidance
/// timestep is locked to the simulation tick.
pub fn simulate(scenario: &Scenario, config: &SimConfig) -> Result<SimRecord> {
    let guidance_config = scenario.guidance.clone().with_dt(config.dt);
    let mut guidance = Guidance::new(guidance_config)?;
    simulate_with(scenario, config, &mut guidance)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
