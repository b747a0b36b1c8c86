use spawner_ecs::prelude::*;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct A(u32);
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct B(u32);
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct C(u32);
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct D(u32);

#[test]
fn test_filter_includes_and_excludes() -> Result<()> {
    let mut manager = EntityManager::new();
    let abd = manager.spawn(&Archetype::of::<(A, B, D)>())?;
    let ab = manager.spawn(&Archetype::of::<(A, B)>())?;
    let abc = manager.spawn(&Archetype::of::<(A, B, C)>())?;
    let a = manager.spawn(&Archetype::of::<(A,)>())?;

    let mut selection = Selection::<(A, B)>::excluding(ComponentMask::of::<(C,)>());
    manager.update_selection(&mut selection);

    let mut seen: Vec<Entity> = selection.iter(&manager).map(|(entity, _)| entity).collect();
    seen.sort();
    let mut expected = vec![abd, ab];
    expected.sort();
    assert_eq!(seen, expected);
    assert!(!seen.contains(&abc));
    assert!(!seen.contains(&a));
    Ok(())
}

#[test]
fn test_update_selection_is_idempotent() -> Result<()> {
    let mut manager = EntityManager::new();
    manager.spawn_many(&Archetype::of::<(A,)>(), 3)?;

    let mut selection = Selection::<(A,)>::new();
    assert_eq!(manager.update_selection(&mut selection), 1);
    assert_eq!(manager.update_selection(&mut selection), 0);
    assert_eq!(manager.update_selection(&mut selection), 0);
    assert_eq!(selection.matched_spawner_count(), 1);
    assert_eq!(selection.count_entities(&manager), 3);

    // Growth of an already registered spawner needs no refresh
    manager.spawn_many(&Archetype::of::<(A,)>(), 2)?;
    assert_eq!(selection.count_entities(&manager), 5);

    // A new spawner stays invisible until the next refresh
    manager.spawn(&Archetype::of::<(A, D)>())?;
    assert_eq!(selection.count_entities(&manager), 5);
    manager.update_selection(&mut selection);
    assert_eq!(selection.count_entities(&manager), 6);
    Ok(())
}

#[test]
fn test_iteration_writes_through() -> Result<()> {
    let mut manager = EntityManager::new();
    let ab = manager.spawn_many(&Archetype::of::<(A, B)>(), 4)?.to_vec();
    let abc = manager.spawn_many(&Archetype::of::<(A, B, C)>(), 4)?.to_vec();

    let mut selection = Selection::<(A, B)>::new();
    manager.update_selection(&mut selection);

    for (_, (a, b)) in selection.iter_mut(&mut manager) {
        a.0 = 11;
        b.0 = 22;
    }

    for entity in ab.into_iter().chain(abc) {
        assert_eq!(manager.get_component::<A>(entity), Some(&A(11)));
        assert_eq!(manager.get_component::<B>(entity), Some(&B(22)));
    }
    Ok(())
}

#[test]
fn test_destroy_through_spawner_cursor_visits_each_once() -> Result<()> {
    let mut manager = EntityManager::new();
    let archetype = Archetype::of::<(A,)>();
    let spawned = manager.spawn_many(&archetype, 5)?.to_vec();

    let mut visited = Vec::new();
    let mut cursor = manager.cursor(&archetype);
    while let Some(entity) = manager.entity_at(&cursor) {
        visited.push(entity);
        cursor = manager.destroy_at(cursor);
    }

    assert_eq!(visited.len(), 5);
    for entity in &spawned {
        assert_eq!(visited.iter().filter(|&&seen| seen == *entity).count(), 1);
    }
    assert_eq!(manager.entity_count(), 0);
    Ok(())
}

#[test]
fn test_destroy_through_selection_cursor_spans_spawners() -> Result<()> {
    let mut manager = EntityManager::new();
    let keep = manager.spawn_many(&Archetype::of::<(A, C)>(), 3)?.to_vec();
    manager.spawn_many(&Archetype::of::<(A,)>(), 4)?;
    manager.spawn_many(&Archetype::of::<(A, B)>(), 5)?;

    let mut selection = Selection::<(A,)>::excluding(ComponentMask::of::<(C,)>());
    manager.update_selection(&mut selection);

    let mut destroyed = 0;
    let mut cursor = selection.begin(&manager);
    while cursor != selection.end() {
        cursor = manager.destroy_at(cursor);
        destroyed += 1;
    }

    assert_eq!(destroyed, 9);
    assert_eq!(selection.count_entities(&manager), 0);
    assert_eq!(manager.entity_count(), keep.len());
    Ok(())
}

#[test]
fn test_selective_destroy_while_iterating() -> Result<()> {
    let mut manager = EntityManager::new();
    let entities = manager.spawn_many(&Archetype::of::<(A,)>(), 10)?.to_vec();
    for (i, &entity) in entities.iter().enumerate() {
        manager.add_component(entity, A(i as u32))?;
    }

    let mut selection = Selection::<(A,)>::new();
    manager.update_selection(&mut selection);

    let mut cursor = selection.begin(&manager);
    while !cursor.is_end() {
        if cursor.component::<A>(&manager).0 % 2 == 0 {
            cursor = manager.destroy_at(cursor);
        } else {
            cursor.advance(&manager);
        }
    }

    let mut left: Vec<u32> = selection.iter(&manager).map(|(_, (a,))| a.0).collect();
    left.sort();
    assert_eq!(left, vec![1, 3, 5, 7, 9]);
    Ok(())
}

#[test]
fn test_change_archetype_through_selection_cursor() -> Result<()> {
    let mut manager = EntityManager::new();
    let source = Archetype::of::<(A, B)>();
    let target = Archetype::of::<(A, B, C)>();
    let entities = manager.spawn_many(&source, 6)?.to_vec();
    for (i, &entity) in entities.iter().enumerate() {
        manager.add_component(entity, B(i as u32))?;
    }

    let mut selection = Selection::<(A, B)>::excluding(ComponentMask::of::<(C,)>());
    manager.update_selection(&mut selection);

    let mut moved = 0;
    let mut cursor = selection.begin(&manager);
    while !cursor.is_end() {
        cursor = manager.change_archetype_at(cursor, &target)?;
        moved += 1;
    }

    assert_eq!(moved, 6);
    assert!(manager.entities_of(&source).is_empty());
    for (i, &entity) in entities.iter().enumerate() {
        assert_eq!(manager.get_component::<B>(entity), Some(&B(i as u32)));
        assert_eq!(manager.get_component::<C>(entity), Some(&C(0)));
    }
    Ok(())
}

#[test]
fn test_advance_by_overrun_stops_at_end() -> Result<()> {
    let mut manager = EntityManager::new();
    manager.spawn_many(&Archetype::of::<(A,)>(), 2)?;
    manager.spawn_many(&Archetype::of::<(A, B)>(), 2)?;

    let mut selection = Selection::<(A,)>::new();
    manager.update_selection(&mut selection);

    let mut cursor = selection.begin(&manager);
    cursor.advance_by(3, &manager);
    assert!(!cursor.is_end());
    cursor.advance_by(100, &manager);
    assert_eq!(cursor, selection.end());
    Ok(())
}

#[test]
fn test_group_tracks_new_archetypes() -> Result<()> {
    let mut manager = EntityManager::new();
    let mut group = Group::<(A,)>::new(&manager);

    manager.spawn_many(&Archetype::of::<(A,)>(), 2)?;
    manager.spawn_many(&Archetype::of::<(A, B)>(), 3)?;
    assert_eq!(group.iter(&manager).len(), 5);
    Ok(())
}
