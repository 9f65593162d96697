pub mod angle;

pub use angle::{adjust_angle, bearing, heading_of, normalized_angle, DEGENERATE_LENGTH_SQ};
