//! Example: Basic spawner usage
//!
//! Spawns two archetypes, runs a movement pass through a selection and
//! prints the spawner layout.

use spawner_ecs::debug::ManagerInspector;
use spawner_ecs::prelude::*;

// Define components
#[derive(Debug, Default)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Default)]
struct Velocity {
    x: f32,
    y: f32,
}

#[allow(dead_code)]
#[derive(Debug, Default)]
struct Sleeping;

fn main() -> Result<()> {
    println!("=== Basic Spawner Example ===");

    let mut manager = EntityManager::new();

    println!("Spawning entities...");
    for i in 0..10 {
        manager.spawn_bundle((
            Position {
                x: i as f32,
                y: i as f32,
            },
            Velocity { x: 0.1, y: 0.0 },
        ))?;
    }
    manager.spawn_many(&Archetype::of::<(Position, Velocity, Sleeping)>(), 5)?;
    println!("Spawned {} entities", manager.entity_count());

    // Move everything that is awake
    let mut selection = Selection::<(Position, Velocity)>::excluding(ComponentMask::of::<(Sleeping,)>());
    manager.update_selection(&mut selection);
    selection.for_each(&mut manager, |_, (pos, vel)| {
        pos.x += vel.x;
        pos.y += vel.y;
    });
    println!("Moved {} awake entities", selection.count_entities(&manager));

    ManagerInspector::print_summary(&manager);

    println!("=== Example Complete ===");
    Ok(())
}
