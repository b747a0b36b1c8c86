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

//! Per-archetype storage: Structure of Arrays with swap-and-pop removal
//!
//! A spawner owns one pool of entity handles and one pool per component type
//! of its archetype. All pools are index-aligned: row `i` of every pool
//! belongs to the entity at row `i` of the handle pool, and all pools have
//! the same length after every operation.

use std::any::TypeId;
use std::ops::Range;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::component::{Component, ComponentId, ComponentRegistry, MAX_SET_COMPONENTS};
use crate::entity::Entity;
use crate::error::{EcsError, Result};
use crate::mask::ComponentMask;
use crate::pool::{ErasedPool, Pool};

/// Index of a spawner inside its manager. Spawners are never removed, so ids
/// stay valid for the manager's lifetime.
pub type SpawnerId = usize;

/// Storage for every entity of one archetype
pub struct EntitySpawner {
    id: SpawnerId,
    mask: ComponentMask,
    entities: Pool<Entity>,
    pools: Vec<Box<dyn ErasedPool>>,
    component_ids: SmallVec<[ComponentId; MAX_SET_COMPONENTS]>,
    pool_slots: FxHashMap<ComponentId, usize>,
}

impl EntitySpawner {
    /// Create spawner with one empty pool per component of `mask`
    pub fn new(id: SpawnerId, mask: ComponentMask) -> Result<Self> {
        let mut pools = Vec::with_capacity(mask.count());
        let mut component_ids = SmallVec::with_capacity(mask.count());
        let mut pool_slots = FxHashMap::default();

        for component in mask.ones() {
            let info = ComponentRegistry::info(component)
                .ok_or(EcsError::UnregisteredComponent(component.index()))?;
            pool_slots.insert(component, pools.len());
            component_ids.push(component);
            pools.push(info.new_pool());
        }

        Ok(Self {
            id,
            mask,
            entities: Pool::new(),
            pools,
            component_ids,
            pool_slots,
        })
    }

    pub fn id(&self) -> SpawnerId {
        self.id
    }

    /// Archetype mask, fixed at construction
    pub fn mask(&self) -> &ComponentMask {
        &self.mask
    }

    /// Component ids in pool-slot order
    pub fn component_ids(&self) -> &[ComponentId] {
        &self.component_ids
    }

    /// Entity handles, row-aligned with every component pool
    pub fn entities(&self) -> &Pool<Entity> {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Append `entity` with default-initialized components, returning its row
    pub fn spawn(&mut self, entity: Entity) -> usize {
        for pool in &mut self.pools {
            pool.grow_default(1);
        }
        self.entities.push(entity)
    }

    /// Append many entities in one reservation pass
    ///
    /// Storage for every pool is reserved before anything is appended, so a
    /// failed reservation leaves the spawner untouched. `handles` is consumed
    /// after the pools have grown; the `i`-th handle lands on row
    /// `start + i` of the returned range.
    pub fn spawn_bulk<I>(&mut self, handles: I) -> Result<Range<usize>>
    where
        I: IntoIterator<Item = Entity>,
        I::IntoIter: ExactSizeIterator,
    {
        let handles = handles.into_iter();
        let count = handles.len();
        self.try_reserve(count)?;

        let start = self.entities.len();
        for pool in &mut self.pools {
            pool.grow_default(count);
        }
        for entity in handles {
            self.entities.push(entity);
        }

        assert_eq!(
            self.entities.len(),
            start + count,
            "handle iterator reported a wrong length"
        );
        Ok(start..start + count)
    }

    /// Reserve room for `additional` rows in every pool
    pub fn reserve(&mut self, additional: usize) {
        self.entities.reserve(additional);
        for pool in &mut self.pools {
            pool.reserve(additional);
        }
    }

    /// Fallible [`EntitySpawner::reserve`]; lengths never change
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.entities
            .try_reserve(additional)
            .map_err(EcsError::allocation(additional))?;
        for pool in &mut self.pools {
            pool.try_reserve(additional)
                .map_err(EcsError::allocation(additional))?;
        }
        Ok(())
    }

    /// Swap-and-pop `row` out of every pool
    ///
    /// Returns the entity that was moved into `row`, if any, so its handle
    /// entry can be fixed up.
    ///
    /// # Panics
    /// Panics if `row >= len`.
    pub fn destroy_at(&mut self, row: usize) -> Option<Entity> {
        let moved = self.entities.swap_remove(row);
        for pool in &mut self.pools {
            pool.swap_remove_at(row);
        }
        moved.map(|_| self.entities[row])
    }

    /// Move the entity at `row` into `other`
    ///
    /// Components present in both masks are moved, components only in
    /// `other` are default-initialized, the rest are dropped. The entity is
    /// then swap-and-popped out of `self`.
    ///
    /// Returns the entity's new row in `other` and the entity swapped into
    /// `row` of `self`, if any.
    ///
    /// # Panics
    /// Panics if `row >= len`.
    pub fn move_entity_to(&mut self, row: usize, other: &mut EntitySpawner) -> (usize, Option<Entity>) {
        assert!(
            row < self.len(),
            "spawner row {row} out of range (len {})",
            self.len()
        );
        let new_row = other.len();

        for (slot, pool) in self.pools.iter_mut().enumerate() {
            match other.pool_slots.get(&self.component_ids[slot]) {
                Some(&dst) => pool.move_into(row, other.pools[dst].as_mut()),
                None => pool.swap_remove_at(row),
            }
        }
        for (slot, pool) in other.pools.iter_mut().enumerate() {
            if !self.mask.has(other.component_ids[slot]) {
                pool.grow_default(1);
            }
        }

        let (entity, moved) = self.entities.take(row);
        other.entities.push(entity);

        (new_row, moved.map(|_| self.entities[row]))
    }

    /// Drop every row, yielding the handles that were stored
    pub fn clear(&mut self) -> std::vec::Drain<'_, Entity> {
        for pool in &mut self.pools {
            pool.clear();
        }
        self.entities.drain()
    }

    /// Check if the archetype includes `component`
    pub fn has(&self, component: ComponentId) -> bool {
        self.mask.has(component)
    }

    /// Pool slot of `component`
    pub fn pool_slot(&self, component: ComponentId) -> Option<usize> {
        self.pool_slots.get(&component).copied()
    }

    /// Typed pool of `T`, if `T` is part of the archetype
    pub fn pool<T: Component>(&self) -> Option<&Pool<T>> {
        let slot = self.pool_slot(ComponentRegistry::lookup(TypeId::of::<T>())?)?;
        self.pools[slot].as_any().downcast_ref()
    }

    /// Mutable typed pool of `T`, if `T` is part of the archetype
    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut Pool<T>> {
        let slot = self.pool_slot(ComponentRegistry::lookup(TypeId::of::<T>())?)?;
        self.pools[slot].as_any_mut().downcast_mut()
    }

    /// Typed pool at a precomputed slot
    ///
    /// # Panics
    /// Panics if the slot does not hold a `Pool<T>`.
    pub fn pool_at<T: Component>(&self, slot: usize) -> &Pool<T> {
        match self.pools[slot].as_any().downcast_ref() {
            Some(pool) => pool,
            None => panic!("pool slot {slot} does not hold {}", std::any::type_name::<T>()),
        }
    }

    /// Mutable typed pool at a precomputed slot
    ///
    /// # Panics
    /// Panics if the slot does not hold a `Pool<T>`.
    pub fn pool_at_mut<T: Component>(&mut self, slot: usize) -> &mut Pool<T> {
        match self.pools[slot].as_any_mut().downcast_mut() {
            Some(pool) => pool,
            None => panic!("pool slot {slot} does not hold {}", std::any::type_name::<T>()),
        }
    }

    /// Runtime-typed pools in slot order
    pub fn erased_pools(&self) -> impl Iterator<Item = &dyn ErasedPool> {
        self.pools.iter().map(|pool| pool.as_ref())
    }

    #[cfg(test)]
    pub(crate) fn pools_aligned(&self) -> bool {
        self.pools.iter().all(|pool| pool.len() == self.entities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentSet;
    use slotmap::KeyData;

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Position(f32, f32);

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Velocity(f32, f32);

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Tag;

    fn handle(n: u32) -> Entity {
        // Version 1 is the first valid slotmap version
        Entity::from(KeyData::from_ffi((1 << 32) | u64::from(n)))
    }

    fn spawner_of<S: ComponentSet>() -> EntitySpawner {
        EntitySpawner::new(0, S::mask()).unwrap()
    }

    #[test]
    fn test_spawn_default_initializes() {
        let mut spawner = spawner_of::<(Position, Velocity)>();
        let row = spawner.spawn(handle(1));
        assert_eq!(row, 0);
        assert_eq!(spawner.pool::<Position>().unwrap()[0], Position::default());
        assert!(spawner.pool::<Tag>().is_none());
        assert!(spawner.pools_aligned());
    }

    #[test]
    fn test_spawn_bulk_keeps_pools_aligned() {
        let mut spawner = spawner_of::<(Position, Velocity, Tag)>();
        spawner.spawn(handle(0));
        let range = spawner.spawn_bulk((1..6).map(handle)).unwrap();
        assert_eq!(range, 1..6);
        assert_eq!(spawner.len(), 6);
        assert_eq!(spawner.entities()[3], handle(3));
        assert!(spawner.pools_aligned());
    }

    #[test]
    fn test_destroy_at_swaps_last_in() {
        let mut spawner = spawner_of::<(Position,)>();
        for n in 0..4 {
            let row = spawner.spawn(handle(n));
            spawner.pool_mut::<Position>().unwrap()[row] = Position(n as f32, 0.0);
        }

        assert_eq!(spawner.destroy_at(1), Some(handle(3)));
        assert_eq!(spawner.entities()[1], handle(3));
        assert_eq!(spawner.pool::<Position>().unwrap()[1], Position(3.0, 0.0));
        assert_eq!(spawner.destroy_at(2), None);
        assert_eq!(spawner.len(), 2);
        assert!(spawner.pools_aligned());
    }

    #[test]
    fn test_move_entity_to_grows_and_shrinks() {
        let mut small = spawner_of::<(Position,)>();
        let mut big = EntitySpawner::new(1, <(Position, Velocity)>::mask()).unwrap();

        small.spawn(handle(0));
        small.spawn(handle(1));
        small.pool_mut::<Position>().unwrap()[0] = Position(4.0, 2.0);

        let (row, swapped) = small.move_entity_to(0, &mut big);
        assert_eq!(row, 0);
        assert_eq!(swapped, Some(handle(1)));
        assert_eq!(big.entities()[0], handle(0));
        assert_eq!(big.pool::<Position>().unwrap()[0], Position(4.0, 2.0));
        assert_eq!(big.pool::<Velocity>().unwrap()[0], Velocity::default());

        let (row, swapped) = big.move_entity_to(0, &mut small);
        assert_eq!(row, 1);
        assert_eq!(swapped, None);
        assert_eq!(small.pool::<Position>().unwrap()[1], Position(4.0, 2.0));
        assert!(small.pools_aligned() && big.pools_aligned());
        assert!(big.is_empty());
    }

    #[test]
    fn test_clear_yields_handles() {
        let mut spawner = spawner_of::<(Position,)>();
        spawner.spawn_bulk((0..3).map(handle)).unwrap();
        let drained: Vec<_> = spawner.clear().collect();
        assert_eq!(drained, vec![handle(0), handle(1), handle(2)]);
        assert!(spawner.is_empty());
        assert!(spawner.pools_aligned());
    }

    #[test]
    fn test_failed_reserve_leaves_pools_untouched() {
        let mut spawner = spawner_of::<(Position, Velocity)>();
        spawner.spawn_bulk((0..2).map(handle)).unwrap();

        assert_eq!(
            spawner.try_reserve(usize::MAX / 2),
            Err(EcsError::AllocationFailed {
                requested: usize::MAX / 2
            })
        );
        assert_eq!(spawner.len(), 2);
        assert!(spawner.erased_pools().all(|pool| pool.len() == 2));
        assert!(spawner.pools_aligned());
    }

    #[test]
    fn test_unregistered_mask_is_rejected() {
        let mask: ComponentMask = std::iter::once(ComponentId::from_index(1 << 20)).collect();
        assert_eq!(
            EntitySpawner::new(0, mask).err(),
            Some(EcsError::UnregisteredComponent(1 << 20))
        );
    }
}
