#![allow(dead_code, unused_imports)]

use spawner_ecs::{Archetype, EntityManager, Selection};
use std::{fs::File, time::Instant};

#[cfg(feature = "profiling")]
use tracing_subscriber::{self, prelude::*};

#[derive(Debug, Clone, Default)]
struct Position(f32, f32, f32);

#[derive(Debug, Clone, Default)]
struct Velocity(f32, f32, f32);

#[derive(Debug, Clone, Default)]
struct Health(u32);

#[cfg(feature = "profiling")]
#[tracing::instrument(skip(manager))]
fn profile_spawns(manager: &mut EntityManager, count: usize) {
    let _span = tracing::info_span!("spawn_loop", count = count).entered();
    for i in 0..count {
        if i % 1_000 == 0 {
            tracing::info!("Spawning entity {}/{}", i, count);
        }
        if let Err(err) = manager.spawn_bundle((
            Position(1.0, 2.0, 3.0),
            Velocity(1.0, 0.0, 0.0),
            Health(100),
        )) {
            tracing::error!("spawn failed: {err}");
            return;
        }
    }
}

#[cfg(feature = "profiling")]
#[tracing::instrument(skip(manager))]
fn profile_iteration(manager: &mut EntityManager) -> usize {
    let mut selection = Selection::<(Position, Velocity)>::new();
    manager.update_selection(&mut selection);
    let _span = tracing::info_span!("integrate", entities = selection.count_entities(manager)).entered();
    selection.for_each(manager, |_, (pos, vel)| {
        pos.0 += vel.0;
        pos.1 += vel.1;
        pos.2 += vel.2;
    });
    selection.count_entities(manager)
}

#[cfg(feature = "profiling")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing subscriber to write to a file
    let file = File::create("trace.json")?;
    let (non_blocking, _guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .json()
        .init();

    let mut manager = EntityManager::new();

    println!("Warming up...");
    {
        let _span = tracing::info_span!("warmup").entered();
        manager.spawn_many(&Archetype::of::<(Position, Velocity)>(), 1000)?;
    }

    println!("Profiling spawn with 3 components...");
    let start = Instant::now();
    profile_spawns(&mut manager, 10_000);
    println!("Spawn 10k entities complete in: {:?}", start.elapsed());

    let start = Instant::now();
    let visited = profile_iteration(&mut manager);
    println!("Iterated {visited} entities in: {:?}", start.elapsed());
    Ok(())
}

#[cfg(not(feature = "profiling"))]
fn main() {
    println!("profile_spawn binary requires --features profiling");
}
