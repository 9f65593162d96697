pub mod state;

pub use state::{Actuation, BodyState, SimConfig};
