pub mod engagement;
pub mod presets;

pub use engagement::{Scenario, ScenarioBuilder};
