//! Example: Destroying and re-archetyping entities while iterating
//!
//! Cursor-taking operations hand back a cursor that already accounts for
//! the swap-and-pop shift, so every entity is visited exactly once.

use spawner_ecs::prelude::*;

#[derive(Debug, Default)]
struct Health(i32);

#[allow(dead_code)]
#[derive(Debug, Default)]
struct Poisoned;

fn main() -> Result<()> {
    let mut manager = EntityManager::new();
    let alive = Archetype::of::<(Health,)>();

    for (i, &entity) in manager.spawn_many(&alive, 8)?.to_vec().iter().enumerate() {
        manager.add_component(entity, Health(i as i32 * 10))?;
    }

    // Poison every entity below 40 health
    let poisoned = alive.with::<Poisoned>();
    let mut selection = Selection::<(Health,)>::excluding(ComponentMask::of::<(Poisoned,)>());
    manager.update_selection(&mut selection);

    let mut cursor = selection.begin(&manager);
    while !cursor.is_end() {
        if cursor.component::<Health>(&manager).0 < 40 {
            cursor = manager.change_archetype_at(cursor, &poisoned)?;
        } else {
            cursor.advance(&manager);
        }
    }
    println!("Poisoned: {}", manager.entities_of(&poisoned).len());

    // Poison finishes them off
    let mut cursor = manager.cursor(&poisoned);
    while manager.entity_at(&cursor).is_some() {
        cursor = manager.destroy_at(cursor);
    }
    println!("Survivors: {}", manager.entity_count());
    Ok(())
}
