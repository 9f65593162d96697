pub mod history;
pub mod pid;
pub mod config;
pub mod steering;
pub mod controller;
pub mod guidance;

pub use history::SignalHistory;
pub use pid::{Pid, PidGains, MIN_SAMPLES};
pub use config::{GuidanceConfig, GuidanceLimits, HeadingSource, ThrustLaw};
pub use steering::{ThrustController, TurnSolution};
pub use controller::{Command, Controller};
pub use guidance::{Guidance, GuidanceEvent, GuidanceState};
