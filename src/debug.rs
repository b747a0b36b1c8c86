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

use crate::component::ComponentRegistry;
use crate::entity::Entity;
use crate::manager::EntityManager;
use crate::spawner::{EntitySpawner, SpawnerId};

/// Manager inspector for debugging
pub struct ManagerInspector;

impl ManagerInspector {
    /// Get spawner summary
    pub fn spawner_summary(manager: &EntityManager) -> Vec<SpawnerInfo> {
        manager.spawners().iter().map(SpawnerInfo::of).collect()
    }

    /// Get storage totals
    pub fn stats(manager: &EntityManager) -> ManagerStats {
        let spawners = manager.spawners();
        let pool_bytes = spawners
            .iter()
            .map(|spawner| {
                let handles = spawner.capacity() * std::mem::size_of::<Entity>();
                let components: usize = spawner
                    .erased_pools()
                    .map(|pool| pool.capacity() * pool.item_size())
                    .sum();
                handles + components
            })
            .sum();

        ManagerStats {
            entities: manager.entity_count(),
            spawners: spawners.len(),
            empty_spawners: spawners.iter().filter(|spawner| spawner.is_empty()).count(),
            pool_bytes,
        }
    }

    /// Print manager summary to console
    pub fn print_summary(manager: &EntityManager) {
        let stats = Self::stats(manager);
        println!("=== Manager Summary ===");
        println!("Entities: {}", stats.entities);
        println!("Spawners: {} ({} empty)", stats.spawners, stats.empty_spawners);
        println!("Pool memory: {} bytes", stats.pool_bytes);

        println!("\n=== Spawners ===");
        for info in Self::spawner_summary(manager) {
            println!(
                "Spawner {}: {} entities, [{}]",
                info.id,
                info.entity_count,
                info.components.join(", ")
            );
        }
    }

    /// Print entity details
    pub fn print_entity(manager: &EntityManager, entity: Entity) {
        match manager.location_of(entity) {
            Some(location) => {
                println!("=== Entity {entity:?} ===");
                println!("Spawner: {}", location.spawner);
                println!("Row: {}", location.row);
                if let Some(spawner) = manager.spawner(location.spawner) {
                    println!("Components: {} types", spawner.component_ids().len());
                }
            }
            None => println!("Entity {entity:?} not found"),
        }
    }
}

/// Spawner information for debugging
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnerInfo {
    pub id: SpawnerId,
    pub components: Vec<String>,
    pub entity_count: usize,
    pub capacity: usize,
}

impl SpawnerInfo {
    fn of(spawner: &EntitySpawner) -> Self {
        let components = spawner
            .component_ids()
            .iter()
            .map(|&id| match ComponentRegistry::info(id) {
                Some(info) => info.name.to_string(),
                None => format!("#{}", id.index()),
            })
            .collect();

        Self {
            id: spawner.id(),
            components,
            entity_count: spawner.len(),
            capacity: spawner.capacity(),
        }
    }
}

/// Storage totals across all spawners
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManagerStats {
    pub entities: usize,
    pub spawners: usize,
    pub empty_spawners: usize,
    /// Reserved bytes of every pool, handles included
    pub pool_bytes: usize,
}
