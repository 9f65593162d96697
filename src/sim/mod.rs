pub mod integrator;
pub mod runner;
pub mod event;
pub mod target;

pub use runner::{simulate, simulate_with, SimRecord};
pub use integrator::semi_implicit_euler;
pub use target::TargetTrack;
