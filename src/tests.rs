// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cross-module tests for the manager, selections and inspector

#[cfg(test)]
mod tests {
    #![allow(clippy::module_inception)]
    use crate::debug::ManagerInspector;
    use crate::{Archetype, ComponentMask, EcsError, EntityManager, Group, ManagerConfig, Result, Selection};

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Frozen;

    #[test]
    fn test_movement_pass() -> Result<()> {
        let mut manager = EntityManager::new();
        let moving = manager.spawn_bundle((Position { x: 0.0, y: 0.0 }, Velocity { x: 1.0, y: 2.0 }))?;
        let frozen = manager.spawn_bundle((
            Position { x: 5.0, y: 5.0 },
            Velocity { x: 1.0, y: 1.0 },
            Frozen,
        ))?;

        let mut group = Group::<(Position, Velocity)>::excluding(&manager, ComponentMask::of::<(Frozen,)>());
        for _ in 0..3 {
            group.for_each(&mut manager, |_, (pos, vel)| {
                pos.x += vel.x;
                pos.y += vel.y;
            });
        }

        assert_eq!(manager.get_component::<Position>(moving), Some(&Position { x: 3.0, y: 6.0 }));
        assert_eq!(manager.get_component::<Position>(frozen), Some(&Position { x: 5.0, y: 5.0 }));

        // Thawing moves the entity into the spawner the group already walks
        manager.remove_component::<Frozen>(frozen)?;
        group.for_each(&mut manager, |_, (pos, vel)| {
            pos.x += vel.x;
            pos.y += vel.y;
        });
        assert_eq!(manager.get_component::<Position>(frozen), Some(&Position { x: 6.0, y: 6.0 }));
        Ok(())
    }

    #[test]
    fn test_config_is_honoured() {
        let config = ManagerConfig {
            initial_spawner_capacity: 4,
            initial_entity_capacity: 128,
            max_batch_size: 1_000,
        };
        let mut manager = EntityManager::with_config(config);
        assert_eq!(manager.config(), &config);
        assert!(manager.handles().capacity() >= 128);
        assert_eq!(
            manager.spawn_many(&Archetype::of::<(Position,)>(), 1_001).err(),
            Some(EcsError::BatchTooLarge {
                requested: 1_001,
                max: 1_000
            })
        );
    }

    #[test]
    fn test_empty_archetype_entities() -> Result<()> {
        let mut manager = EntityManager::new();
        let bare = manager.spawn(&Archetype::empty())?;
        manager.spawn(&Archetype::of::<(Position,)>())?;

        let mut everything = Selection::<()>::new();
        manager.update_selection(&mut everything);
        assert_eq!(everything.count_entities(&manager), 2);

        manager.add_component(bare, Velocity { x: 4.0, y: 0.0 })?;
        assert_eq!(manager.mask_of(bare), Some(Archetype::of::<(Velocity,)>().mask()));
        manager.remove_component::<Velocity>(bare)?;
        assert_eq!(manager.mask_of(bare), Some(Archetype::empty().mask()));
        Ok(())
    }

    #[test]
    fn test_inspector_after_churn() -> Result<()> {
        let mut manager = EntityManager::new();
        let archetype = Archetype::of::<(Position, Velocity)>();
        manager.spawn_many(&archetype, 20)?;
        manager.spawn_many(&archetype.without::<Velocity>(), 5)?;
        manager.clear(&archetype);

        let stats = ManagerInspector::stats(&manager);
        assert_eq!(stats.entities, 5);
        assert_eq!(stats.spawners, 2);
        assert_eq!(stats.empty_spawners, 1);

        let summary = ManagerInspector::spawner_summary(&manager);
        assert_eq!(summary.iter().map(|info| info.entity_count).sum::<usize>(), 5);
        Ok(())
    }
}
