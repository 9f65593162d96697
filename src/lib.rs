pub mod error;
pub mod math;
pub mod physics;
pub mod dynamics;
mod gnc_mod;
pub mod sim;
pub mod scenario;
pub mod entity;
pub mod io;

// The gnc module: expose gnc_mod as `gnc` publicly
pub mod gnc {
    pub use crate::gnc_mod::*;
}

pub use error::{GuidanceError, Result};
pub use entity::{EntityKind, GuidedEntity};
pub use gnc::{Command, Controller, Guidance, GuidanceConfig, GuidanceState, Pid, PidGains};
pub use physics::{Body, BodyDef, BodyHandle, BodyShape, RigidBody, World};
pub use scenario::Scenario;
pub use sim::{simulate, simulate_with, SimRecord};
