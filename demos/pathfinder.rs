use nalgebra::Vector2;

use missile_guidance::entity::{EntityKind, GuidedEntity};
use missile_guidance::gnc::{GuidanceConfig, GuidanceEvent, GuidanceState};
use missile_guidance::physics::{RigidBody, World};
use missile_guidance::scenario::presets;

const DT: f64 = 1.0 / 60.0;

fn main() -> missile_guidance::Result<()> {
    let mut world = World::default();
    let mut missile = GuidedEntity::spawn(
        &mut world,
        EntityKind::Missile,
        &presets::missile_airframe(),
        GuidanceConfig::default(),
    )?;

    let waypoints = vec![
        Vector2::new(200.0, 0.0),
        Vector2::new(200.0, 120.0),
        Vector2::new(-50.0, 120.0),
        Vector2::new(-50.0, -60.0),
    ];
    println!("Following {} waypoints with {} ...", waypoints.len(), missile.kind());
    missile.command_follow_path(&mut world, waypoints)?;

    let mut t = 0.0;
    let mut distance = 0.0;
    while missile.state() != GuidanceState::Idle && t < 60.0 {
        let before = missile.body(&world)?.position();
        missile.update(&mut world)?;
        world.step(DT);
        t += DT;
        distance += (missile.body(&world)?.position() - before).norm();

        for event in missile.drain_events() {
            match event {
                GuidanceEvent::WaypointReached { waypoint, remaining } => println!(
                    "  t={:>6.2}s  reached ({:.0}, {:.0}), {} left",
                    t, waypoint.x, waypoint.y, remaining
                ),
                GuidanceEvent::StateChanged { from, to } => println!("  t={:>6.2}s  {from} -> {to}", t),
                _ => {}
            }
        }
    }

    let body = missile.body(&world)?;
    println!(
        "Finished at ({:.1}, {:.1}) after {:.1} s, {:.0} m flown, speed {:.1} m/s",
        body.position().x,
        body.position().y,
        t,
        distance,
        body.linear_velocity().norm()
    );
    Ok(())
}
