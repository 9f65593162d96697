pub mod body;
pub mod world;

pub use body::{Body, BodyDef, BodyShape, RigidBody};
pub use world::{BodyHandle, World};
