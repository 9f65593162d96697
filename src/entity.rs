use std::fmt;

use nalgebra::Vector2;
use tracing::warn;

use crate::error::Result;
use crate::gnc::{Command, Guidance, GuidanceConfig, GuidanceEvent, GuidanceState};
use crate::physics::{Body, BodyDef, BodyHandle, World};

// ---------------------------------------------------------------------------
// Guided entity: world handle + steering state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Missile,
    Target,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Missile => "Missile",
            EntityKind::Target => "Target",
        })
    }
}

/// A steered body. The world owns the body; the entity only holds a handle,
/// so every call that touches the body fails cleanly once it is destroyed.
#[derive(Debug)]
pub struct GuidedEntity {
    kind: EntityKind,
    handle: BodyHandle,
    guidance: Guidance,
}

impl GuidedEntity {
    /// Create the body in `world` and attach guidance to it.
    pub fn spawn(
        world: &mut World,
        kind: EntityKind,
        def: &BodyDef,
        config: GuidanceConfig,
    ) -> Result<Self> {
        let guidance = Guidance::new(config)?;
        let handle = world.create_body(def);
        Ok(Self { kind, handle, guidance })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn guidance(&self) -> &Guidance {
        &self.guidance
    }

    pub fn guidance_mut(&mut self) -> &mut Guidance {
        &mut self.guidance
    }

    pub fn state(&self) -> GuidanceState {
        self.guidance.state()
    }

    pub fn body<'w>(&self, world: &'w World) -> Result<&'w Body> {
        world.body(self.handle).ok_or_else(|| self.handle.stale())
    }

    fn body_mut<'w>(&self, world: &'w mut World) -> Result<&'w mut Body> {
        match world.body_mut(self.handle) {
            Some(body) => Ok(body),
            None => {
                warn!(kind = %self.kind, index = self.handle.index(), "guided body no longer exists");
                Err(self.handle.stale())
            }
        }
    }

    pub fn command(&mut self, world: &mut World, command: Command) -> Result<()> {
        let body = self.body_mut(world)?;
        self.guidance.apply(body, command);
        Ok(())
    }

    pub fn command_idle(&mut self, world: &mut World) -> Result<()> {
        self.command(world, Command::Idle)
    }

    pub fn command_turn_towards(&mut self, world: &mut World, target: Vector2<f64>) -> Result<()> {
        self.command(world, Command::TurnTowards { target })
    }

    pub fn command_seek(&mut self, world: &mut World, target: Vector2<f64>) -> Result<()> {
        self.command(world, Command::Seek { target })
    }

    pub fn command_follow_path(&mut self, world: &mut World, waypoints: Vec<Vector2<f64>>) -> Result<()> {
        self.command(world, Command::FollowPath { waypoints })
    }

    pub fn set_target_position(&mut self, target: Vector2<f64>) {
        self.guidance.set_target_position(target);
    }

    /// Run guidance for this tick. Call before `World::step`.
    pub fn update(&mut self, world: &mut World) -> Result<()> {
        let body = self.body_mut(world)?;
        self.guidance.update(body);
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<GuidanceEvent> {
        self.guidance.drain_events()
    }

    /// Remove the body from the world, consuming the entity.
    pub fn despawn(self, world: &mut World) -> Result<Body> {
        world.destroy_body(self.handle)
    }
}
