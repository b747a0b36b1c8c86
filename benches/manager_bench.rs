use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use spawner_ecs::{Archetype, ComponentMask, EntityManager, Selection};

const ENTITIES: usize = 100_000;

macro_rules! comps {
    ($($name:ident),*) => {
        $(
            #[derive(Debug, Default, Clone, Copy)]
            #[allow(dead_code)]
            struct $name {
                x: u64,
                y: u64,
            }
        )*
    };
}

comps!(C0, C1, C2, C3, C4, C5, C6, C7, C8, C9, C10);

type Full = (C0, C1, C2);

fn full() -> Archetype {
    Archetype::of::<Full>()
}

fn missing() -> Archetype {
    Archetype::of::<(C0, C1)>()
}

fn populated(archetype: &Archetype) -> EntityManager {
    let mut manager = EntityManager::new();
    manager
        .spawn_many(archetype, ENTITIES)
        .expect("bench spawn");
    manager
}

fn iterate(selection: &Selection<Full>, manager: &mut EntityManager) {
    for (_, (a, b, c)) in selection.iter_mut(manager) {
        a.x = 0;
        b.x = 0;
        c.x = 0;
    }
}

fn creation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("creation");
    group.sample_size(20);

    group.bench_function("sequential", |b| {
        b.iter_batched(
            EntityManager::new,
            |mut manager| {
                let archetype = full();
                for _ in 0..ENTITIES {
                    manager.spawn(&archetype).expect("spawn");
                }
                manager
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("sequential_reserved", |b| {
        b.iter_batched(
            || {
                let mut manager = EntityManager::new();
                manager.prepare_to_spawn(&full(), ENTITIES).expect("reserve");
                manager
            },
            |mut manager| {
                let archetype = full();
                for _ in 0..ENTITIES {
                    manager.spawn(&archetype).expect("spawn");
                }
                manager
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("at_once", |b| {
        b.iter_batched(
            EntityManager::new,
            |mut manager| {
                manager.spawn_many(&full(), ENTITIES).expect("spawn");
                manager
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn destroy_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("destroy");
    group.sample_size(20);

    group.bench_function("sequential", |b| {
        b.iter_batched(
            || populated(&full()),
            |mut manager| {
                let mut cursor = manager.cursor(&full());
                while manager.entity_at(&cursor).is_some() {
                    cursor = manager.destroy_at(cursor);
                }
                manager
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("at_once", |b| {
        b.iter_batched(
            || populated(&full()),
            |mut manager| {
                black_box(manager.clear(&full()));
                manager
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn iteration_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");

    group.bench_function("full", |b| {
        let mut manager = populated(&full());
        let mut selection = Selection::<Full>::new();
        manager.update_selection(&mut selection);
        b.iter(|| iterate(&selection, &mut manager))
    });

    group.bench_function("half", |b| {
        let mut manager = EntityManager::new();
        for i in 0..ENTITIES {
            let archetype = if i % 2 == 1 { full() } else { missing() };
            manager.spawn(&archetype).expect("spawn");
        }
        let mut selection = Selection::<Full>::new();
        manager.update_selection(&mut selection);
        b.iter(|| iterate(&selection, &mut manager))
    });

    group.bench_function("one_of_many", |b| {
        let mut manager = EntityManager::new();
        manager.spawn_many(&missing(), ENTITIES / 2).expect("spawn");
        manager.spawn(&full()).expect("spawn");
        manager.spawn_many(&missing(), ENTITIES / 2 - 1).expect("spawn");
        let mut selection = Selection::<Full>::new();
        manager.update_selection(&mut selection);
        b.iter(|| iterate(&selection, &mut manager))
    });

    group.bench_function("realistic", |b| {
        let interactive = Archetype::of::<(C0, C1, C2, C3)>();
        let dynamic = full();
        let fixed = missing();
        let ai = Archetype::of::<(C4, C5, C6, C7, C8)>();
        let players = Archetype::of::<(C4, C5, C6, C9, C10)>();

        let mut manager = populated(&dynamic);
        // Knock out half of the dynamic bodies in a scattered order
        let mut seed = 0x2545_f491_u64;
        for _ in 0..ENTITIES / 2 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let entities = manager.entities_of(&dynamic);
            let victim = entities[(seed as usize) % entities.len()];
            manager.destroy(victim).expect("destroy");
        }

        for i in 0..ENTITIES / 200 {
            manager.spawn_many(&interactive, 4).expect("spawn");
            manager.spawn_many(&dynamic, 100).expect("spawn");
            manager.spawn_many(&fixed, 5).expect("spawn");
            if i % 10 == 0 {
                manager.spawn(&ai).expect("spawn");
            }
            if i == ENTITIES / 100 / 2 {
                manager.spawn_many(&players, 10).expect("spawn");
            }
        }

        let mut selection = Selection::<Full>::excluding(ComponentMask::new());
        manager.update_selection(&mut selection);
        b.iter(|| iterate(&selection, &mut manager))
    });

    group.finish();
}

fn change_archetype_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_archetype");
    group.sample_size(20);

    group.bench_function("add_components", |b| {
        let target = Archetype::of::<(C0, C1, C2, C3, C4)>();
        b.iter_batched(
            || populated(&missing()),
            |mut manager| {
                let mut selection = Selection::<(C0, C1)>::excluding(ComponentMask::of::<(C2,)>());
                manager.update_selection(&mut selection);
                let mut cursor = selection.begin(&manager);
                while !cursor.is_end() {
                    cursor = manager
                        .change_archetype_at(cursor, &target)
                        .expect("change archetype");
                }
                manager
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("remove_components", |b| {
        let source = Archetype::of::<(C0, C1, C2, C3, C4)>();
        b.iter_batched(
            || populated(&source),
            |mut manager| {
                let mut selection = Selection::<(C0, C1, C2, C3, C4)>::new();
                manager.update_selection(&mut selection);
                let mut cursor = selection.begin(&manager);
                while !cursor.is_end() {
                    cursor = manager
                        .change_archetype_at(cursor, &missing())
                        .expect("change archetype");
                }
                manager
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    creation_benchmark,
    destroy_benchmark,
    iteration_benchmark,
    change_archetype_benchmark
);
criterion_main!(benches);
