use std::collections::VecDeque;
use std::fmt;

use nalgebra::Vector2;
use tracing::info;

use crate::error::Result;
use crate::physics::RigidBody;
use super::config::{GuidanceConfig, GuidanceLimits};
use super::controller::{Command, Controller};
use super::pid::Pid;
use super::steering::{apply_turn_torque, ThrustController, TurnSolution};

// ---------------------------------------------------------------------------
// Guidance states and diagnostic events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GuidanceState {
    #[default]
    Idle,
    TurnTowards,
    Seek,
    FollowPath,
}

impl fmt::Display for GuidanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuidanceState::Idle => "IDLE",
            GuidanceState::TurnTowards => "TURN",
            GuidanceState::Seek => "SEEK",
            GuidanceState::FollowPath => "PATH",
        };
        f.write_str(name)
    }
}

/// Emitted by [`Guidance`] and drained by its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum GuidanceEvent {
    StateChanged { from: GuidanceState, to: GuidanceState },
    WaypointReached { waypoint: Vector2<f64>, remaining: usize },
    /// Seek came within the arrival radius and stopped the body.
    Arrived { target: Vector2<f64> },
    PathCompleted,
}

// ---------------------------------------------------------------------------
// Guidance state machine
// ---------------------------------------------------------------------------

/// Steering state machine for one guided body.
///
/// Commands switch state immediately and run the new state's entry logic;
/// [`Guidance::update`] runs the current state's per-tick logic. Both must be
/// called before the physics step that should see the resulting forces.
#[derive(Debug, Clone)]
pub struct Guidance {
    state: GuidanceState,
    target: Vector2<f64>,
    path: VecDeque<Vector2<f64>>,
    turn: Pid,
    thrust: ThrustController,
    config: GuidanceConfig,
    arrived: bool,
    last_turn: Option<TurnSolution>,
    events: Vec<GuidanceEvent>,
}

impl Guidance {
    pub fn new(config: GuidanceConfig) -> Result<Self> {
        config.validate()?;
        let mut turn = Pid::with_gains(config.turn_gains);
        turn.set_time_step(config.dt)?;
        turn.set_max_history(config.max_history)?;
        let thrust = ThrustController::new(
            config.thrust_law,
            config.thrust_gains,
            config.dt,
            config.max_history,
        )?;
        Ok(Self {
            state: GuidanceState::Idle,
            target: Vector2::zeros(),
            path: VecDeque::new(),
            turn,
            thrust,
            config,
            arrived: false,
            last_turn: None,
            events: Vec::new(),
        })
    }

    pub fn state(&self) -> GuidanceState {
        self.state
    }

    pub fn target(&self) -> Vector2<f64> {
        self.target
    }

    /// Waypoints still to be reached; the front is the current target.
    pub fn path(&self) -> impl Iterator<Item = &Vector2<f64>> {
        self.path.iter()
    }

    pub fn config(&self) -> &GuidanceConfig {
        &self.config
    }

    pub fn limits(&self) -> &GuidanceLimits {
        &self.config.limits
    }

    pub fn set_limits(&mut self, limits: GuidanceLimits) -> Result<()> {
        limits.validate()?;
        self.config.limits = limits;
        Ok(())
    }

    pub fn turn_controller(&self) -> &Pid {
        &self.turn
    }

    pub fn thrust_controller(&self) -> &ThrustController {
        &self.thrust
    }

    /// Turn-law output from the most recent tick that produced one.
    pub fn last_turn(&self) -> Option<TurnSolution> {
        self.last_turn
    }

    pub fn drain_events(&mut self) -> Vec<GuidanceEvent> {
        std::mem::take(&mut self.events)
    }

    // -- commands -----------------------------------------------------------

    pub fn command_idle(&mut self, body: &mut dyn RigidBody) {
        self.change_state(GuidanceState::Idle, body);
    }

    pub fn command_turn_towards(&mut self, body: &mut dyn RigidBody, position: Vector2<f64>) {
        self.target = position;
        self.change_state(GuidanceState::TurnTowards, body);
    }

    pub fn command_seek(&mut self, body: &mut dyn RigidBody, position: Vector2<f64>) {
        self.target = position;
        self.change_state(GuidanceState::Seek, body);
    }

    /// Replace the waypoint queue and start following it. An empty (or
    /// already reached) path leaves the machine in Idle before returning.
    pub fn command_follow_path<I>(&mut self, body: &mut dyn RigidBody, waypoints: I)
    where
        I: IntoIterator<Item = Vector2<f64>>,
    {
        self.path = waypoints.into_iter().collect();
        self.change_state(GuidanceState::FollowPath, body);
    }

    /// Move the target without changing state. While following a path the
    /// waypoint currently being chased is replaced.
    pub fn set_target_position(&mut self, position: Vector2<f64>) {
        self.target = position;
        if self.state == GuidanceState::FollowPath {
            if let Some(front) = self.path.front_mut() {
                *front = position;
            }
        }
    }

    pub fn apply(&mut self, body: &mut dyn RigidBody, command: Command) {
        match command {
            Command::Idle => self.command_idle(body),
            Command::TurnTowards { target } => self.command_turn_towards(body, target),
            Command::Seek { target } => self.command_seek(body, target),
            Command::FollowPath { waypoints } => self.command_follow_path(body, waypoints),
            Command::SetTarget { target } => self.set_target_position(target),
        }
    }

    /// Run the current state for one tick.
    pub fn update(&mut self, body: &mut dyn RigidBody) {
        let next = self.execute(body);
        if next != self.state {
            self.change_state(next, body);
        }
    }

    // -- transitions --------------------------------------------------------

    fn change_state(&mut self, requested: GuidanceState, body: &mut dyn RigidBody) {
        let from = self.state;
        let mut next = requested;
        // Entry logic may redirect (FollowPath with nothing left -> Idle).
        loop {
            let entered = self.enter(next, body);
            if entered == next {
                break;
            }
            next = entered;
        }
        self.state = next;
        // Re-entering the current state reruns its entry logic quietly.
        if next != from {
            info!(%from, to = %next, "guidance state change");
            self.events.push(GuidanceEvent::StateChanged { from, to: next });
        }
    }

    fn enter(&mut self, state: GuidanceState, body: &mut dyn RigidBody) -> GuidanceState {
        match state {
            GuidanceState::Idle => {
                stop_body(body);
                GuidanceState::Idle
            }
            GuidanceState::TurnTowards => {
                self.setup_turn(body);
                GuidanceState::TurnTowards
            }
            GuidanceState::Seek => {
                self.arrived = false;
                self.setup_thrust(body);
                self.setup_turn(body);
                GuidanceState::Seek
            }
            GuidanceState::FollowPath => {
                if self.config.seed_path_with_position {
                    self.path.push_front(body.position());
                }
                if self.advance_path(body.position()) {
                    self.setup_thrust(body);
                    self.setup_turn(body);
                    GuidanceState::FollowPath
                } else {
                    self.events.push(GuidanceEvent::PathCompleted);
                    GuidanceState::Idle
                }
            }
        }
    }

    fn execute(&mut self, body: &mut dyn RigidBody) -> GuidanceState {
        match self.state {
            GuidanceState::Idle => GuidanceState::Idle,
            GuidanceState::TurnTowards => {
                self.turn_towards_target(body);
                GuidanceState::TurnTowards
            }
            GuidanceState::Seek => {
                if self.is_near(&self.target, &body.position()) {
                    stop_body(body);
                    if !self.arrived {
                        self.arrived = true;
                        info!(x = self.target.x, y = self.target.y, "arrived at seek target");
                        self.events.push(GuidanceEvent::Arrived { target: self.target });
                    }
                } else {
                    self.arrived = false;
                    self.turn_towards_target(body);
                    self.thrust_towards_target(body);
                }
                GuidanceState::Seek
            }
            GuidanceState::FollowPath => {
                if self.advance_path(body.position()) {
                    self.thrust_towards_target(body);
                    self.turn_towards_target(body);
                    GuidanceState::FollowPath
                } else {
                    self.events.push(GuidanceEvent::PathCompleted);
                    GuidanceState::Idle
                }
            }
        }
    }

    // -- helpers ------------------------------------------------------------

    fn setup_turn(&mut self, body: &mut dyn RigidBody) {
        body.set_angular_damping(0.0);
        self.turn.reset_history();
        self.turn.set_gains(self.config.turn_gains);
        self.last_turn = None;
    }

    fn setup_thrust(&mut self, body: &mut dyn RigidBody) {
        body.set_linear_damping(0.0);
        self.thrust.setup(self.config.thrust_gains);
    }

    fn turn_towards_target(&mut self, body: &mut dyn RigidBody) {
        let solution = apply_turn_torque(
            body,
            &self.target,
            &mut self.turn,
            &self.config.limits,
            self.config.heading_source,
        );
        if solution.is_some() {
            self.last_turn = solution;
        }
    }

    fn thrust_towards_target(&mut self, body: &mut dyn RigidBody) {
        self.thrust.apply(body, &self.target, &self.config.limits, self.config.dt);
    }

    fn is_near(&self, point: &Vector2<f64>, position: &Vector2<f64>) -> bool {
        let r = self.config.limits.min_arrival_distance;
        (point - position).norm_squared() < r * r
    }

    /// Drop every waypoint already within the arrival radius; the first one
    /// that is not becomes the target. Returns false when none remain.
    fn advance_path(&mut self, position: Vector2<f64>) -> bool {
        while let Some(&waypoint) = self.path.front() {
            if self.is_near(&waypoint, &position) {
                self.path.pop_front();
                info!(x = waypoint.x, y = waypoint.y, remaining = self.path.len(), "waypoint reached");
                self.events.push(GuidanceEvent::WaypointReached {
                    waypoint,
                    remaining: self.path.len(),
                });
            } else {
                self.target = waypoint;
                return true;
            }
        }
        false
    }
}

fn stop_body(body: &mut dyn RigidBody) {
    body.set_linear_velocity(Vector2::zeros());
    body.set_angular_velocity(0.0);
}

impl Controller for Guidance {
    fn command(&mut self, body: &mut dyn RigidBody, command: Command) {
        self.apply(body, command);
    }

    fn update(&mut self, body: &mut dyn RigidBody) {
        Guidance::update(self, body);
    }

    fn reset(&mut self) {
        self.turn.reset_history();
        self.thrust.reset();
        self.last_turn = None;
        self.arrived = false;
    }

    fn name(&self) -> &str {
        "Guidance"
    }

    fn target(&self) -> Option<Vector2<f64>> {
        match self.state {
            GuidanceState::Idle => None,
            _ => Some(self.target),
        }
    }

    fn drain_events(&mut self) -> Vec<GuidanceEvent> {
        Guidance::drain_events(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnc::pid::PidGains;
    use crate::gnc::ThrustLaw;
    use crate::physics::{Body, BodyDef, BodyShape};
    use approx::assert_relative_eq;

    fn missile() -> Body {
        Body::new(&BodyDef::new(BodyShape::Box { half_width: 2.5, half_height: 1.0 }))
    }

    fn guidance() -> Guidance {
        Guidance::new(GuidanceConfig::default()).unwrap()
    }

    #[test]
    fn starts_idle() {
        let g = guidance();
        assert_eq!(g.state(), GuidanceState::Idle);
        assert!(Controller::target(&g).is_none());
    }

    #[test]
    fn rejects_invalid_config() {
        let bad = GuidanceConfig::default().with_dt(-1.0);
        assert!(Guidance::new(bad).is_err());
    }

    #[test]
    fn seek_dead_ahead_thrusts_without_torque() {
        let mut body = missile();
        let mut g = guidance();
        g.command_seek(&mut body, Vector2::new(100.0, 0.0));
        g.update(&mut body);
        assert_eq!(body.applied_torque(), 0.0);
        let f = body.applied_force();
        assert!(f.x > 0.0);
        assert_relative_eq!(f.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn seek_dead_ahead_with_warm_controller() {
        let mut body = missile();
        let mut g = guidance();
        g.command_seek(&mut body, Vector2::new(100.0, 0.0));
        for _ in 0..5 {
            body.clear_forces();
            g.update(&mut body);
        }
        assert_eq!(body.applied_torque(), 0.0);
        assert!(body.applied_force().x > 0.0);
    }

    #[test]
    fn seek_stops_inside_arrival_radius_and_stays_in_seek() {
        let mut body = missile();
        body.set_linear_velocity(Vector2::new(3.0, 1.0));
        body.set_angular_velocity(0.7);
        let mut g = guidance();
        g.command_seek(&mut body, Vector2::new(4.0, 0.0));
        g.drain_events();
        g.update(&mut body);
        assert_eq!(g.state(), GuidanceState::Seek);
        assert_eq!(body.linear_velocity(), Vector2::zeros());
        assert_eq!(body.angular_velocity(), 0.0);
        assert_eq!(body.applied_force(), Vector2::zeros());
        assert_eq!(g.drain_events(), vec![GuidanceEvent::Arrived { target: Vector2::new(4.0, 0.0) }]);
        // Arrival is reported once per approach.
        g.update(&mut body);
        assert!(g.drain_events().is_empty());
    }

    #[test]
    fn follow_empty_path_goes_idle_within_command() {
        let mut body = missile();
        let mut g = guidance();
        g.command_seek(&mut body, Vector2::new(100.0, 0.0));
        g.drain_events();
        g.command_follow_path(&mut body, Vec::new());
        assert_eq!(g.state(), GuidanceState::Idle);
        assert_eq!(
            g.drain_events(),
            vec![
                GuidanceEvent::PathCompleted,
                GuidanceEvent::StateChanged { from: GuidanceState::Seek, to: GuidanceState::Idle },
            ]
        );
    }

    #[test]
    fn follow_path_skips_waypoints_already_reached() {
        let mut body = missile();
        let mut g = guidance();
        let path = vec![Vector2::new(1.0, 1.0), Vector2::new(-3.0, 2.0), Vector2::new(80.0, 0.0)];
        g.command_follow_path(&mut body, path);
        assert_eq!(g.state(), GuidanceState::FollowPath);
        assert_eq!(g.target(), Vector2::new(80.0, 0.0));
        assert_eq!(g.path().count(), 1);
    }

    #[test]
    fn follow_path_with_only_nearby_points_goes_idle() {
        let mut body = missile();
        let mut g = guidance();
        g.command_follow_path(&mut body, vec![Vector2::new(2.0, 0.0)]);
        assert_eq!(g.state(), GuidanceState::Idle);
    }

    #[test]
    fn seeded_path_starts_at_body() {
        let mut body = missile();
        body.set_position(Vector2::new(10.0, 10.0));
        let config = GuidanceConfig::default().with_seeded_paths(true);
        let mut g = Guidance::new(config).unwrap();
        g.command_follow_path(&mut body, vec![Vector2::new(100.0, 10.0)]);
        let events = g.drain_events();
        assert!(matches!(
            events[0],
            GuidanceEvent::WaypointReached { remaining: 1, .. }
        ));
        assert_eq!(g.target(), Vector2::new(100.0, 10.0));
    }

    #[test]
    fn follow_path_pops_on_arrival_then_idles() {
        let mut body = missile();
        let mut g = guidance();
        g.command_follow_path(&mut body, vec![Vector2::new(50.0, 0.0), Vector2::new(50.0, 50.0)]);
        assert_eq!(g.target(), Vector2::new(50.0, 0.0));

        body.set_position(Vector2::new(45.0, 0.0));
        g.update(&mut body);
        assert_eq!(g.state(), GuidanceState::FollowPath);
        assert_eq!(g.target(), Vector2::new(50.0, 50.0));

        body.set_linear_velocity(Vector2::new(1.0, 2.0));
        body.set_position(Vector2::new(50.0, 48.0));
        g.update(&mut body);
        assert_eq!(g.state(), GuidanceState::Idle);
        assert_eq!(body.linear_velocity(), Vector2::zeros());
    }

    #[test]
    fn idle_from_any_state_zeroes_velocity() {
        let orders = [
            Command::TurnTowards { target: Vector2::new(0.0, 40.0) },
            Command::Seek { target: Vector2::new(40.0, 40.0) },
            Command::FollowPath { waypoints: vec![Vector2::new(-40.0, 0.0)] },
            Command::Idle,
        ];
        for order in orders {
            let mut body = missile();
            let mut g = guidance();
            g.apply(&mut body, order);
            body.set_linear_velocity(Vector2::new(5.0, -2.0));
            body.set_angular_velocity(1.5);
            g.command_idle(&mut body);
            g.update(&mut body);
            assert_eq!(body.linear_velocity(), Vector2::zeros());
            assert_eq!(body.angular_velocity(), 0.0);
            assert_eq!(g.state(), GuidanceState::Idle);
        }
    }

    #[test]
    fn turn_towards_applies_torque_only() {
        let mut body = missile();
        let mut g = guidance();
        g.command_turn_towards(&mut body, Vector2::new(0.0, 50.0));
        for _ in 0..3 {
            body.clear_forces();
            g.update(&mut body);
        }
        assert!(body.applied_torque() > 0.0, "should turn counter-clockwise");
        assert_eq!(body.applied_force(), Vector2::zeros());
        assert_eq!(g.state(), GuidanceState::TurnTowards);
    }

    #[test]
    fn set_target_keeps_state() {
        let mut body = missile();
        let mut g = guidance();
        g.command_turn_towards(&mut body, Vector2::new(0.0, 50.0));
        g.set_target_position(Vector2::new(-5.0, 5.0));
        assert_eq!(g.state(), GuidanceState::TurnTowards);
        assert_eq!(g.target(), Vector2::new(-5.0, 5.0));
    }

    #[test]
    fn set_target_redirects_current_waypoint() {
        let mut body = missile();
        let mut g = guidance();
        g.command_follow_path(&mut body, vec![Vector2::new(100.0, 0.0), Vector2::new(100.0, 100.0)]);
        g.set_target_position(Vector2::new(0.0, 100.0));
        g.update(&mut body);
        assert_eq!(g.state(), GuidanceState::FollowPath);
        assert_eq!(g.target(), Vector2::new(0.0, 100.0));
        // Later waypoints are untouched.
        let rest: Vec<_> = g.path().copied().collect();
        assert_eq!(rest, vec![Vector2::new(0.0, 100.0), Vector2::new(100.0, 100.0)]);
    }

    #[test]
    fn reentering_a_state_emits_no_transition() {
        let mut body = missile();
        let mut g = guidance();
        body.set_linear_velocity(Vector2::new(3.0, 0.0));
        g.command_idle(&mut body);
        assert!(g.drain_events().is_empty());
        assert_eq!(body.linear_velocity(), Vector2::zeros());

        g.command_seek(&mut body, Vector2::new(50.0, 0.0));
        g.command_seek(&mut body, Vector2::new(0.0, 50.0));
        assert_eq!(
            g.drain_events(),
            vec![GuidanceEvent::StateChanged { from: GuidanceState::Idle, to: GuidanceState::Seek }]
        );
        assert_eq!(g.target(), Vector2::new(0.0, 50.0));
    }

    #[test]
    fn entering_turn_resets_history_and_gains() {
        let mut body = missile();
        let config = GuidanceConfig::default().with_turn_gains(PidGains::new(1.0, 0.0, 0.0));
        let mut g = Guidance::new(config).unwrap();
        g.command_turn_towards(&mut body, Vector2::new(0.0, 50.0));
        for _ in 0..4 {
            g.update(&mut body);
        }
        assert_eq!(g.turn_controller().errors().len(), 4);
        g.command_seek(&mut body, Vector2::new(50.0, 0.0));
        assert!(g.turn_controller().errors().is_empty());
        assert_eq!(g.turn_controller().gains(), PidGains::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn position_pid_law_owns_controllers() {
        let config = GuidanceConfig::default().with_thrust_law(ThrustLaw::PositionPid);
        let g = Guidance::new(config).unwrap();
        assert_eq!(g.thrust_controller().law(), ThrustLaw::PositionPid);
    }

    #[test]
    fn limits_can_be_replaced_but_are_validated() {
        let mut g = guidance();
        let limits = GuidanceLimits { min_arrival_distance: 1.0, ..GuidanceLimits::default() };
        g.set_limits(limits).unwrap();
        assert_eq!(g.limits().min_arrival_distance, 1.0);
        let bad = GuidanceLimits { max_linear_acceleration: f64::INFINITY, ..limits };
        assert!(g.set_limits(bad).is_err());
        assert_eq!(g.limits().max_linear_acceleration, limits.max_linear_acceleration);
    }

    #[test]
    fn negative_limits_never_reach_the_steering_laws() {
        let negative = GuidanceLimits { max_angular_acceleration: -1.0, ..GuidanceLimits::default() };
        assert!(Guidance::new(GuidanceConfig::default().with_limits(negative)).is_err());

        let mut g = guidance();
        assert!(g.set_limits(negative).is_err());
        let mut body = missile();
        g.command_turn_towards(&mut body, Vector2::new(0.0, 50.0));
        for _ in 0..3 {
            body.clear_forces();
            g.update(&mut body);
        }
        assert!(body.applied_torque().abs() <= g.limits().max_angular_acceleration * body.inertia());
    }
}
