use spawner_ecs::prelude::*;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct X {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Y {
    value: u64,
}

const COUNT: usize = 1_000_000;

#[test]
fn test_million_entities_iterate_and_reset() -> Result<()> {
    let mut manager = EntityManager::new();
    let archetype = Archetype::of::<(X, Y)>();
    manager.spawn_many(&archetype, COUNT)?;

    let mut selection = Selection::<(X, Y)>::new();
    manager.update_selection(&mut selection);

    // Seed non-zero values so the reset below is observable
    selection.for_each(&mut manager, |_, (x, y)| {
        x.value = 7;
        y.value = 3;
    });
    assert!(selection.iter(&manager).all(|(_, (x, _))| x.value == 7));

    for (_, (x, _)) in selection.iter_mut(&mut manager) {
        x.value = 0;
    }

    assert_eq!(selection.count_entities(&manager), COUNT);
    assert_eq!(manager.entity_count(), COUNT);

    let mut visited = 0;
    for (_, (x, y)) in selection.iter(&manager) {
        assert_eq!(x.value, 0);
        assert_eq!(y.value, 3);
        visited += 1;
    }
    assert_eq!(visited, COUNT);
    Ok(())
}
