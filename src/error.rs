use std::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Crate error type
// ---------------------------------------------------------------------------

/// Errors surfaced by configuration, world access and file I/O.
///
/// Numerical warm-up and degenerate geometry are not errors: the controller
/// outputs zero and the steering laws treat a zero-length target vector as
/// "arrived".
#[derive(Debug)]
pub enum GuidanceError {
    /// Controller timestep at or below the numeric floor.
    InvalidTimeStep(f64),
    /// History capacity below the controller's minimum sample count.
    InvalidMaxHistory { requested: usize, minimum: usize },
    /// A steering limit that must be finite and non-negative was not.
    InvalidLimit { name: &'static str, value: f64 },
    /// Scenario description failed validation.
    InvalidScenario(String),
    /// The body behind a handle has been destroyed.
    StaleHandle { index: usize, generation: u32 },
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for GuidanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuidanceError::InvalidTimeStep(dt) => {
                write!(f, "invalid controller timestep: {dt} (must be > {:e})", crate::gnc::pid::MIN_TIME_STEP)
            }
            GuidanceError::InvalidMaxHistory { requested, minimum } => {
                write!(f, "invalid history length {requested}: at least {minimum} samples required")
            }
            GuidanceError::InvalidLimit { name, value } => {
                write!(f, "invalid limit {name} = {value}: must be finite and non-negative")
            }
            GuidanceError::InvalidScenario(msg) => write!(f, "invalid scenario: {msg}"),
            GuidanceError::StaleHandle { index, generation } => {
                write!(f, "body handle {index}/{generation} no longer refers to a live body")
            }
            GuidanceError::Io(e) => write!(f, "I/O error: {e}"),
            GuidanceError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for GuidanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuidanceError::Io(e) => Some(e),
            GuidanceError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GuidanceError {
    fn from(e: io::Error) -> Self {
        GuidanceError::Io(e)
    }
}

impl From<serde_json::Error> for GuidanceError {
    fn from(e: serde_json::Error) -> Self {
        GuidanceError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, GuidanceError>;
