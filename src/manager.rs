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

//! Entity manager: spawners, the handle table and archetype lookup

use ahash::AHashMap;

#[cfg(feature = "profiling")]
use tracing::{debug, info_span};

use crate::archetype::Archetype;
use crate::component::{Component, ComponentRegistry, ComponentSet};
use crate::entity::{Entity, EntityLocation, HandleTable};
use crate::error::{EcsError, Result};
use crate::mask::ComponentMask;
use crate::selection::Selection;
use crate::spawner::{EntitySpawner, SpawnerId};

/// Hard upper bound on a single bulk spawn
pub const MAX_BATCH_SIZE: usize = 10_000_000;

/// Runtime tuning for an [`EntityManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Spawner slots reserved up front
    pub initial_spawner_capacity: usize,
    /// Handle table slots reserved up front
    pub initial_entity_capacity: usize,
    /// Largest accepted `spawn_many` count, capped at [`MAX_BATCH_SIZE`]
    pub max_batch_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            initial_spawner_capacity: 64,
            initial_entity_capacity: 0,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// Position that survives the removal of the entity under it
///
/// [`EntityManager::destroy_at`] and [`EntityManager::change_archetype_at`]
/// take a cursor and hand back one that points at the next entity not yet
/// visited, accounting for the swap-and-pop shift.
pub trait EntityCursor: Sized {
    /// Spawner and row under the cursor, `None` at the end
    fn location(&self) -> Option<EntityLocation>;

    /// Re-anchor after the entity under the cursor left its spawner
    fn after_removal(self, manager: &EntityManager) -> Self;

    /// Step past the entity under the cursor
    fn advanced(self, manager: &EntityManager) -> Self;
}

/// Cursor over the entities of a single archetype
///
/// ```ignore
/// let mut cursor = manager.cursor(&archetype);
/// while manager.entity_at(&cursor).is_some() {
///     cursor = manager.destroy_at(cursor);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnerCursor {
    spawner: Option<SpawnerId>,
    row: usize,
}

impl SpawnerCursor {
    pub fn spawner(&self) -> Option<SpawnerId> {
        self.spawner
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Cursor one row further
    #[must_use]
    pub fn next(self) -> Self {
        Self {
            row: self.row + 1,
            ..self
        }
    }
}

impl EntityCursor for SpawnerCursor {
    fn location(&self) -> Option<EntityLocation> {
        self.spawner.map(|spawner| EntityLocation {
            spawner,
            row: self.row,
        })
    }

    fn after_removal(self, _manager: &EntityManager) -> Self {
        // The last entity was swapped into `row`, which has not been visited
        self
    }

    fn advanced(self, _manager: &EntityManager) -> Self {
        self.next()
    }
}

/// Owns every spawner and the handle table
pub struct EntityManager {
    handles: HandleTable,
    spawners: Vec<EntitySpawner>,
    spawner_index: AHashMap<ComponentMask, SpawnerId>,
    config: ManagerConfig,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            handles: HandleTable::with_capacity(config.initial_entity_capacity),
            spawners: Vec::with_capacity(config.initial_spawner_capacity),
            spawner_index: AHashMap::with_capacity(config.initial_spawner_capacity),
            config,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Spawn one entity with default-initialized components
    pub fn spawn(&mut self, archetype: &Archetype) -> Result<Entity> {
        let id = self.spawner_for(archetype)?;
        let spawner = &mut self.spawners[id];
        let entity = self.handles.allocate(EntityLocation {
            spawner: id,
            row: spawner.len(),
        });
        spawner.spawn(entity);
        Ok(entity)
    }

    /// Spawn `count` entities in one reservation pass
    ///
    /// Returns the new handles in row order. On error nothing was spawned.
    pub fn spawn_many(&mut self, archetype: &Archetype, count: usize) -> Result<&[Entity]> {
        let max = self.config.max_batch_size.min(MAX_BATCH_SIZE);
        if count > max {
            return Err(EcsError::BatchTooLarge {
                requested: count,
                max,
            });
        }

        #[cfg(feature = "profiling")]
        let span = info_span!("manager.spawn_many", count, archetype_components = archetype.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let id = self.spawner_for(archetype)?;
        let handles = &mut self.handles;
        let spawner = &mut self.spawners[id];
        handles.reserve(count);

        let start = spawner.len();
        let range = spawner.spawn_bulk((0..count).map(|offset| {
            handles.allocate(EntityLocation {
                spawner: id,
                row: start + offset,
            })
        }))?;

        Ok(&self.spawners[id].entities().as_slice()[range])
    }

    /// Spawn one entity initialized from a tuple of component values
    ///
    /// # Panics
    /// Panics if `B` names the same component type twice.
    pub fn spawn_bundle<B: ComponentSet>(&mut self, bundle: B) -> Result<Entity> {
        assert!(
            B::is_distinct(),
            "a bundle cannot name the same component type twice"
        );
        let entity = self.spawn(&Archetype::of::<B>())?;
        let location = self.handles.locate(entity).ok_or(EcsError::EntityNotFound)?;
        bundle.write(&mut self.spawners[location.spawner], location.row);
        Ok(entity)
    }

    /// Reserve storage for `count` more entities of `archetype`
    ///
    /// Creates the spawner if needed but never creates entities.
    pub fn prepare_to_spawn(&mut self, archetype: &Archetype, count: usize) -> Result<()> {
        let id = self.spawner_for(archetype)?;
        self.spawners[id].try_reserve(count)?;
        self.handles.reserve(count);
        Ok(())
    }

    /// Destroy an entity, invalidating its handle
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        let location = self.handles.release(entity).ok_or(EcsError::EntityNotFound)?;
        if let Some(swapped) = self.spawners[location.spawner].destroy_at(location.row) {
            self.handles.set_row(swapped, location.row);
        }
        Ok(())
    }

    /// Destroy the entity under `cursor`, returning a cursor at the next
    /// unvisited entity
    ///
    /// # Panics
    /// Panics if the cursor is at its end or past its spawner.
    pub fn destroy_at<C: EntityCursor>(&mut self, cursor: C) -> C {
        let (entity, location) = self.resolve_cursor(&cursor);
        self.handles.release(entity);
        if let Some(swapped) = self.spawners[location.spawner].destroy_at(location.row) {
            self.handles.set_row(swapped, location.row);
        }
        cursor.after_removal(self)
    }

    /// Destroy every entity of exactly `archetype`
    ///
    /// Returns how many entities were destroyed. The spawner stays alive
    /// with its capacity intact.
    pub fn clear(&mut self, archetype: &Archetype) -> usize {
        let Some(&id) = self.spawner_index.get(archetype.mask()) else {
            return 0;
        };

        #[cfg(feature = "profiling")]
        let span = info_span!("manager.clear", spawner = id, entities = self.spawners[id].len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let handles = &mut self.handles;
        let mut destroyed = 0;
        for entity in self.spawners[id].clear() {
            handles.release(entity);
            destroyed += 1;
        }
        destroyed
    }

    /// Move an entity to `archetype`
    ///
    /// Shared components keep their values, new ones are default-initialized
    /// and the rest are dropped. The handle stays valid.
    pub fn change_archetype(&mut self, entity: Entity, archetype: &Archetype) -> Result<()> {
        let location = self.handles.locate(entity).ok_or(EcsError::EntityNotFound)?;
        let target = self.spawner_for(archetype)?;
        self.move_entity(entity, location, target);
        Ok(())
    }

    /// Move the entity under `cursor` to `archetype`, returning a cursor at
    /// the next unvisited entity of the source
    ///
    /// If the entity already has `archetype` nothing moves and the cursor is
    /// simply advanced.
    ///
    /// # Panics
    /// Panics if the cursor is at its end or past its spawner.
    pub fn change_archetype_at<C: EntityCursor>(&mut self, cursor: C, archetype: &Archetype) -> Result<C> {
        let (entity, location) = self.resolve_cursor(&cursor);
        let target = self.spawner_for(archetype)?;
        if target == location.spawner {
            return Ok(cursor.advanced(self));
        }
        self.move_entity(entity, location, target);
        Ok(cursor.after_removal(self))
    }

    /// Set component `T`, moving the entity to a wider archetype if needed
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        let location = self.handles.locate(entity).ok_or(EcsError::EntityNotFound)?;
        let id = ComponentRegistry::id_of::<T>();

        let location = if self.spawners[location.spawner].has(id) {
            location
        } else {
            let mut mask = self.spawners[location.spawner].mask().clone();
            mask.insert(id);
            let target = self.spawner_for(&Archetype::from_mask(mask))?;
            self.move_entity(entity, location, target)
        };

        let slot = self.spawners[location.spawner]
            .pool_mut::<T>()
            .and_then(|pool| pool.get_mut(location.row))
            .ok_or(EcsError::ComponentNotFound)?;
        *slot = component;
        Ok(())
    }

    /// Drop component `T`, moving the entity to a narrower archetype
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<()> {
        let location = self.handles.locate(entity).ok_or(EcsError::EntityNotFound)?;
        let id = ComponentRegistry::lookup(std::any::TypeId::of::<T>()).ok_or(EcsError::ComponentNotFound)?;
        let spawner = &self.spawners[location.spawner];
        if !spawner.has(id) {
            return Err(EcsError::ComponentNotFound);
        }

        let mut mask = spawner.mask().clone();
        mask.remove(id);
        let target = self.spawner_for(&Archetype::from_mask(mask))?;
        self.move_entity(entity, location, target);
        Ok(())
    }

    /// Component `T` of `entity`, `None` if stale or not in its archetype
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        let location = self.handles.locate(entity)?;
        self.spawners[location.spawner].pool::<T>()?.get(location.row)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let location = self.handles.locate(entity)?;
        self.spawners[location.spawner]
            .pool_mut::<T>()?
            .get_mut(location.row)
    }

    /// Like [`EntityManager::get_component`] but reports why it failed
    pub fn component_of<T: Component>(&self, entity: Entity) -> Result<&T> {
        let location = self.handles.locate(entity).ok_or(EcsError::EntityNotFound)?;
        self.spawners[location.spawner]
            .pool::<T>()
            .and_then(|pool| pool.get(location.row))
            .ok_or(EcsError::ComponentNotFound)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Register spawners created since the selection's last refresh
    ///
    /// Returns how many were accepted; calling it again without new
    /// spawners returns 0.
    pub fn update_selection<Q: ComponentSet>(&self, selection: &mut Selection<Q>) -> usize {
        selection.refresh(&self.spawners)
    }

    /// Cursor at the first entity of `archetype`
    pub fn cursor(&self, archetype: &Archetype) -> SpawnerCursor {
        SpawnerCursor {
            spawner: self.spawner_index.get(archetype.mask()).copied(),
            row: 0,
        }
    }

    /// Entity under `cursor`, `None` at or past the end
    pub fn entity_at<C: EntityCursor>(&self, cursor: &C) -> Option<Entity> {
        let location = cursor.location()?;
        self.spawners
            .get(location.spawner)?
            .entities()
            .get(location.row)
            .copied()
    }

    /// Entities of exactly `archetype`, in row order
    pub fn entities_of(&self, archetype: &Archetype) -> &[Entity] {
        match self.spawner_index.get(archetype.mask()) {
            Some(&id) => self.spawners[id].entities().as_slice(),
            None => &[],
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.handles.contains(entity)
    }

    pub fn location_of(&self, entity: Entity) -> Option<EntityLocation> {
        self.handles.locate(entity)
    }

    /// Archetype mask of a live entity
    pub fn mask_of(&self, entity: Entity) -> Option<&ComponentMask> {
        let location = self.handles.locate(entity)?;
        Some(self.spawners[location.spawner].mask())
    }

    /// Spawner holding `archetype`, if one was created
    pub fn spawner_id(&self, archetype: &Archetype) -> Option<SpawnerId> {
        self.spawner_index.get(archetype.mask()).copied()
    }

    pub fn entity_count(&self) -> usize {
        self.handles.len()
    }

    pub fn spawner_count(&self) -> usize {
        self.spawners.len()
    }

    pub fn spawner(&self, id: SpawnerId) -> Option<&EntitySpawner> {
        self.spawners.get(id)
    }

    /// Every spawner, indexed by id
    pub fn spawners(&self) -> &[EntitySpawner] {
        &self.spawners
    }

    pub(crate) fn spawners_mut(&mut self) -> &mut [EntitySpawner] {
        &mut self.spawners
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Find or create the spawner for `archetype`
    fn spawner_for(&mut self, archetype: &Archetype) -> Result<SpawnerId> {
        if let Some(&id) = self.spawner_index.get(archetype.mask()) {
            return Ok(id);
        }

        let id = self.spawners.len();
        let spawner = EntitySpawner::new(id, archetype.mask().clone())?;

        #[cfg(feature = "profiling")]
        debug!(spawner = id, components = archetype.len(), "created spawner");

        // Push first so the index never names a missing spawner
        self.spawners.push(spawner);
        self.spawner_index.insert(archetype.mask().clone(), id);
        Ok(id)
    }

    fn resolve_cursor<C: EntityCursor>(&self, cursor: &C) -> (Entity, EntityLocation) {
        let location = match cursor.location() {
            Some(location) => location,
            None => panic!("cursor is at its end"),
        };
        match self.spawners[location.spawner].entities().get(location.row) {
            Some(&entity) => (entity, location),
            None => panic!(
                "cursor row {} is past the end of spawner {}",
                location.row, location.spawner
            ),
        }
    }

    /// Move a live entity between spawners, fixing up both handle entries
    fn move_entity(&mut self, entity: Entity, from: EntityLocation, target: SpawnerId) -> EntityLocation {
        if from.spawner == target {
            return from;
        }

        // Borrow both spawners at once
        let (source, destination) = if from.spawner < target {
            let (left, right) = self.spawners.split_at_mut(target);
            (&mut left[from.spawner], &mut right[0])
        } else {
            let (left, right) = self.spawners.split_at_mut(from.spawner);
            (&mut right[0], &mut left[target])
        };

        let (row, swapped) = source.move_entity_to(from.row, destination);
        if let Some(swapped) = swapped {
            self.handles.set_row(swapped, from.row);
        }

        let location = EntityLocation {
            spawner: target,
            row,
        };
        self.handles.relocate(entity, location);
        location
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
