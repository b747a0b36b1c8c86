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

//! Entity handles and the handle table.

use slotmap::{new_key_type, SlotMap};

use crate::spawner::SpawnerId;

new_key_type! {
    /// Entity handle backed by slotmap's generational keys.
    ///
    /// A destroyed handle never matches a later entity that reuses its slot.
    pub struct Entity;
}

/// Entity location in a spawner (spawner, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub spawner: SpawnerId,
    pub row: usize,
}

/// Maps live handles to their current location
///
/// Every physical move in a spawner (append, swap-and-pop, cross-spawner
/// move) updates exactly the entries it displaces.
#[derive(Debug, Default)]
pub struct HandleTable {
    locations: SlotMap<Entity, EntityLocation>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            locations: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Allocate a fresh handle at `location`
    pub fn allocate(&mut self, location: EntityLocation) -> Entity {
        self.locations.insert(location)
    }

    /// Current location, `None` for stale handles
    pub fn locate(&self, entity: Entity) -> Option<EntityLocation> {
        self.locations.get(entity).copied()
    }

    /// Point a live handle at a new location
    ///
    /// Returns false if the handle is stale.
    pub fn relocate(&mut self, entity: Entity, location: EntityLocation) -> bool {
        match self.locations.get_mut(entity) {
            Some(slot) => {
                *slot = location;
                true
            }
            None => false,
        }
    }

    /// Update only the row of a live handle
    pub fn set_row(&mut self, entity: Entity, row: usize) {
        if let Some(slot) = self.locations.get_mut(entity) {
            slot.row = row;
        }
    }

    /// Invalidate a handle, returning its last location
    pub fn release(&mut self, entity: Entity) -> Option<EntityLocation> {
        self.locations.remove(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.locations.contains_key(entity)
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.locations.capacity()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.locations.reserve(additional);
    }

    /// Live handles and their locations
    pub fn iter(&self) -> impl Iterator<Item = (Entity, EntityLocation)> + '_ {
        self.locations.iter().map(|(entity, loc)| (entity, *loc))
    }
}
