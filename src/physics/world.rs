use nalgebra::Vector2;

use crate::error::{GuidanceError, Result};
use crate::sim::integrator::semi_implicit_euler;
use super::body::{Body, BodyDef};

// ---------------------------------------------------------------------------
// Body arena addressed by generational handles
// ---------------------------------------------------------------------------

/// Non-owning reference to a body in a [`World`].
///
/// A handle outlives its body safely: once the slot is freed (and possibly
/// reused) the generation no longer matches and lookups return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    index: usize,
    generation: u32,
}

impl BodyHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn stale(&self) -> GuidanceError {
        GuidanceError::StaleHandle { index: self.index, generation: self.generation }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

#[derive(Debug, Default)]
pub struct World {
    slots: Vec<Slot>,
    free: Vec<usize>,
    gravity: Vector2<f64>,
}

impl World {
    pub fn new(gravity: Vector2<f64>) -> Self {
        Self { slots: Vec::new(), free: Vec::new(), gravity }
    }

    pub fn gravity(&self) -> Vector2<f64> {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vector2<f64>) {
        self.gravity = gravity;
    }

    pub fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let body = Body::new(def);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.body = Some(body);
            BodyHandle { index, generation: slot.generation }
        } else {
            self.slots.push(Slot { generation: 0, body: Some(body) });
            BodyHandle { index: self.slots.len() - 1, generation: 0 }
        }
    }

    /// Remove a body. Every outstanding handle to it becomes stale.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<Body> {
        let slot = self
            .slots
            .get_mut(handle.index)
            .filter(|s| s.generation == handle.generation && s.body.is_some())
            .ok_or_else(|| handle.stale())?;
        let body = slot.body.take().ok_or_else(|| handle.stale())?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(body)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_ref())
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_mut())
    }

    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    /// Integrate every live body over `dt`. Forces applied since the last
    /// step are consumed.
    pub fn step(&mut self, dt: f64) {
        let gravity = self.gravity;
        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            semi_implicit_euler(body, &gravity, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RigidBody;
    use approx::assert_relative_eq;

    #[test]
    fn destroyed_handles_go_stale() {
        let mut world = World::default();
        let a = world.create_body(&BodyDef::default());
        assert!(world.contains(a));
        world.destroy_body(a).unwrap();
        assert!(!world.contains(a));
        assert!(matches!(world.destroy_body(a), Err(GuidanceError::StaleHandle { .. })));

        // Slot is reused with a new generation; the old handle stays dead.
        let b = world.create_body(&BodyDef::default());
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert!(world.body(a).is_none());
        assert!(world.body(b).is_some());
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn step_applies_gravity_to_all_bodies() {
        let mut world = World::new(Vector2::new(0.0, -10.0));
        let a = world.create_body(&BodyDef::default());
        let b = world.create_body(&BodyDef::default().position(Vector2::new(5.0, 0.0)));
        world.step(0.1);
        for h in [a, b] {
            let v = world.body(h).unwrap().linear_velocity();
            assert_relative_eq!(v.y, -1.0, epsilon = 1e-12);
        }
    }
}
