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

//! Selections: filtered views over every matching spawner
//!
//! A `Selection<Q>` wants the components of the tuple `Q` and rejects a
//! runtime mask of unwanted components. It caches, per accepted spawner, the
//! pool slot of each wanted type so that iteration never repeats a lookup.
//!
//! The selection does not see spawners created after its last refresh; call
//! [`EntityManager::update_selection`] (or use a [`Group`](crate::group::Group))
//! after spawning into new archetypes.
//!
//! A selection holds spawner ids, not references. It must only be used with
//! the manager it was refreshed against; using it with another manager
//! yields unrelated entities or panics on an out-of-range spawner id.
//!
//! ```ignore
//! let mut selection = Selection::<(Position, Velocity)>::excluding(ComponentMask::of::<(Frozen,)>());
//! manager.update_selection(&mut selection);
//! for (_entity, (pos, vel)) in selection.iter_mut(&mut manager) {
//!     pos.x += vel.x;
//! }
//! ```

use std::any::TypeId;
use std::marker::PhantomData;

use smallvec::SmallVec;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::component::{Component, ComponentId, ComponentRegistry, ComponentSet, MAX_SET_COMPONENTS};
use crate::entity::{Entity, EntityLocation};
use crate::manager::{EntityCursor, EntityManager};
use crate::mask::ComponentMask;
use crate::spawner::{EntitySpawner, SpawnerId};

const END: usize = usize::MAX;

/// Spawner accepted by a selection, with the pool slot of each wanted type
#[derive(Debug, Clone)]
struct AcceptedSpawner {
    spawner: SpawnerId,
    slots: SmallVec<[usize; MAX_SET_COMPONENTS]>,
}

/// Filtered view over all spawners whose mask contains every wanted type and
/// none of the unwanted ones
pub struct Selection<Q: ComponentSet = ()> {
    wanted: ComponentMask,
    unwanted: ComponentMask,
    wanted_ids: SmallVec<[ComponentId; MAX_SET_COMPONENTS]>,
    accepted: Vec<AcceptedSpawner>,
    checked_spawners: usize,
    _marker: PhantomData<fn() -> Q>,
}

impl<Q: ComponentSet> Selection<Q> {
    /// Selection with no unwanted components
    pub fn new() -> Self {
        Self::excluding(ComponentMask::new())
    }

    /// Selection rejecting every spawner that has any of `unwanted`
    ///
    /// Wanted types take precedence: they are stripped from `unwanted`.
    ///
    /// # Panics
    /// Panics if `Q` names the same component type twice.
    pub fn excluding(unwanted: ComponentMask) -> Self {
        assert!(
            Q::is_distinct(),
            "a selection cannot name the same component type twice"
        );
        let wanted_ids = Q::component_ids();
        let wanted: ComponentMask = wanted_ids.iter().copied().collect();

        Self {
            unwanted: unwanted.remove_common(&wanted),
            wanted,
            wanted_ids,
            accepted: Vec::new(),
            checked_spawners: 0,
            _marker: PhantomData,
        }
    }

    pub fn wanted(&self) -> &ComponentMask {
        &self.wanted
    }

    pub fn unwanted(&self) -> &ComponentMask {
        &self.unwanted
    }

    /// Filter test for an archetype mask
    pub fn accepts(&self, mask: &ComponentMask) -> bool {
        mask.contains(&self.wanted) && !mask.has_common(&self.unwanted)
    }

    /// Number of spawners examined so far
    pub fn checked_spawners(&self) -> usize {
        self.checked_spawners
    }

    /// Number of accepted spawners
    pub fn matched_spawner_count(&self) -> usize {
        self.accepted.len()
    }

    /// Ids of the accepted spawners, in acceptance order
    pub fn matched_spawners(&self) -> impl Iterator<Item = SpawnerId> + '_ {
        self.accepted.iter().map(|accepted| accepted.spawner)
    }

    /// Examine spawners created since the last refresh
    ///
    /// Returns how many were accepted. Spawners already checked are never
    /// looked at again, so no spawner is registered twice.
    pub(crate) fn refresh(&mut self, spawners: &[EntitySpawner]) -> usize {
        if self.checked_spawners >= spawners.len() {
            return 0;
        }

        #[cfg(feature = "profiling")]
        let _span = info_span!(
            "selection.refresh",
            checked = self.checked_spawners,
            spawner_count = spawners.len()
        )
        .entered();

        let before = self.accepted.len();
        for spawner in &spawners[self.checked_spawners..] {
            if !self.accepts(spawner.mask()) {
                continue;
            }
            let slots: Option<SmallVec<_>> = self
                .wanted_ids
                .iter()
                .map(|&id| spawner.pool_slot(id))
                .collect();
            if let Some(slots) = slots {
                self.accepted.push(AcceptedSpawner {
                    spawner: spawner.id(),
                    slots,
                });
            }
        }
        self.checked_spawners = spawners.len();
        self.accepted.len() - before
    }

    /// Live entities across every accepted spawner
    pub fn count_entities(&self, manager: &EntityManager) -> usize {
        self.accepted
            .iter()
            .map(|accepted| manager.spawners()[accepted.spawner].len())
            .sum()
    }

    /// Cursor at the first entity, or the end cursor if there is none
    pub fn begin(&self, manager: &EntityManager) -> SelectionCursor<'_, Q> {
        let mut cursor = SelectionCursor {
            selection: self,
            spawner: 0,
            row: 0,
        };
        cursor.find_next_spawner(manager);
        cursor
    }

    /// Canonical end cursor
    pub fn end(&self) -> SelectionCursor<'_, Q> {
        SelectionCursor {
            selection: self,
            spawner: END,
            row: 0,
        }
    }

    /// Shared iteration over `(entity, components)`
    pub fn iter<'m>(&self, manager: &'m EntityManager) -> SelectionIter<'m, Q> {
        let spawners = manager.spawners();
        let mut batches = Vec::with_capacity(self.accepted.len());
        let mut remaining = 0;
        for accepted in &self.accepted {
            let spawner = &spawners[accepted.spawner];
            if spawner.is_empty() {
                continue;
            }
            remaining += spawner.len();
            batches.push(Batch {
                entities: spawner.entities().as_slice(),
                columns: Q::columns(spawner, &accepted.slots),
            });
        }

        SelectionIter {
            batches,
            batch: 0,
            row: 0,
            remaining,
        }
    }

    /// Mutable iteration over `(entity, components)`
    pub fn iter_mut<'m>(&self, manager: &'m mut EntityManager) -> SelectionIterMut<'m, Q> {
        let spawners = manager.spawners_mut();
        let mut batches = Vec::with_capacity(self.accepted.len());
        let mut remaining = 0;
        for accepted in &self.accepted {
            let spawner = &mut spawners[accepted.spawner];
            if spawner.is_empty() {
                continue;
            }
            remaining += spawner.len();
            let pointers = Q::pointers(spawner, &accepted.slots);
            let entities = spawner.entities().as_slice();
            batches.push(BatchMut {
                entities: entities.as_ptr(),
                len: entities.len(),
                pointers,
            });
        }

        SelectionIterMut {
            batches,
            batch: 0,
            row: 0,
            remaining,
            _marker: PhantomData,
        }
    }

    /// Run `func` on every selected entity
    pub fn for_each<'m, F>(&self, manager: &'m mut EntityManager, mut func: F)
    where
        F: FnMut(Entity, Q::Muts<'m>),
    {
        for (entity, components) in self.iter_mut(manager) {
            func(entity, components);
        }
    }

    fn wanted_position(&self, type_id: TypeId) -> Option<usize> {
        let id = ComponentRegistry::lookup(type_id)?;
        self.wanted_ids.iter().position(|&wanted| wanted == id)
    }
}

impl<Q: ComponentSet> Default for Selection<Q> {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-level position (accepted spawner, row) inside a selection
///
/// Cursors compare by position only. Comparing cursors of different
/// selections is meaningless and not detected.
///
/// Any structural change to a spawner the cursor walks invalidates it, except
/// through [`EntityManager::destroy_at`] and
/// [`EntityManager::change_archetype_at`], which return a re-anchored cursor.
pub struct SelectionCursor<'s, Q: ComponentSet> {
    selection: &'s Selection<Q>,
    spawner: usize,
    row: usize,
}

impl<'s, Q: ComponentSet> SelectionCursor<'s, Q> {
    pub fn is_end(&self) -> bool {
        self.spawner == END
    }

    /// Step to the next entity, crossing into the next non-empty spawner
    ///
    /// # Panics
    /// Panics on an end cursor.
    pub fn advance(&mut self, manager: &EntityManager) {
        assert!(!self.is_end(), "advanced a selection cursor past its end");
        self.row += 1;
        if self.row >= self.spawner_len(manager) {
            self.spawner += 1;
            self.find_next_spawner(manager);
        }
    }

    /// Step `offset` entities forward, stopping at the end
    ///
    /// # Panics
    /// Panics on an end cursor with a non-zero offset.
    pub fn advance_by(&mut self, offset: usize, manager: &EntityManager) {
        if offset == 0 {
            return;
        }
        assert!(!self.is_end(), "advanced a selection cursor past its end");

        let mut offset = offset;
        while self.spawner < self.selection.accepted.len() {
            let left = self.spawner_len(manager).saturating_sub(self.row);
            if offset < left {
                self.row += offset;
                return;
            }
            offset -= left;
            self.spawner += 1;
            self.row = 0;
        }
        self.spawner = END;
        self.row = 0;
    }

    /// Entity under the cursor
    ///
    /// # Panics
    /// Panics on an end cursor.
    pub fn entity(&self, manager: &EntityManager) -> Entity {
        let (spawner, row) = self.resolve(manager);
        spawner.entities()[row]
    }

    /// All wanted components of the entity under the cursor
    pub fn components<'m>(&self, manager: &'m EntityManager) -> Q::Refs<'m> {
        let accepted = self.accepted();
        let spawner = &manager.spawners()[accepted.spawner];
        Q::fetch(&Q::columns(spawner, &accepted.slots), self.row)
    }

    /// Wanted component `T` of the entity under the cursor
    ///
    /// # Panics
    /// Panics on an end cursor or if `T` is not one of the wanted types.
    pub fn component<'m, T: Component>(&self, manager: &'m EntityManager) -> &'m T {
        let slot = self.slot_of::<T>();
        let (spawner, row) = self.resolve(manager);
        &spawner.pool_at::<T>(slot)[row]
    }

    /// Mutable wanted component `T` of the entity under the cursor
    ///
    /// # Panics
    /// Panics on an end cursor or if `T` is not one of the wanted types.
    pub fn component_mut<'m, T: Component>(&self, manager: &'m mut EntityManager) -> &'m mut T {
        let slot = self.slot_of::<T>();
        let accepted = self.accepted();
        let spawner = &mut manager.spawners_mut()[accepted.spawner];
        &mut spawner.pool_at_mut::<T>(slot)[self.row]
    }

    fn accepted(&self) -> &'s AcceptedSpawner {
        assert!(!self.is_end(), "dereferenced an end selection cursor");
        &self.selection.accepted[self.spawner]
    }

    fn resolve<'m>(&self, manager: &'m EntityManager) -> (&'m EntitySpawner, usize) {
        (&manager.spawners()[self.accepted().spawner], self.row)
    }

    fn slot_of<T: Component>(&self) -> usize {
        match self.selection.wanted_position(TypeId::of::<T>()) {
            Some(position) => self.accepted().slots[position],
            None => panic!(
                "{} is not wanted by this selection",
                std::any::type_name::<T>()
            ),
        }
    }

    fn spawner_len(&self, manager: &EntityManager) -> usize {
        manager.spawners()[self.selection.accepted[self.spawner].spawner].len()
    }

    fn find_next_spawner(&mut self, manager: &EntityManager) {
        self.row = 0;
        while self.spawner < self.selection.accepted.len() {
            if self.spawner_len(manager) > 0 {
                return;
            }
            self.spawner += 1;
        }
        self.spawner = END;
    }
}

impl<'s, Q: ComponentSet> EntityCursor for SelectionCursor<'s, Q> {
    fn location(&self) -> Option<EntityLocation> {
        if self.is_end() {
            return None;
        }
        Some(EntityLocation {
            spawner: self.selection.accepted[self.spawner].spawner,
            row: self.row,
        })
    }

    fn after_removal(mut self, manager: &EntityManager) -> Self {
        // The swapped-in entity now sits at `row`; only move on if the
        // removed entity was the spawner's last one.
        if !self.is_end() && self.row >= self.spawner_len(manager) {
            self.spawner += 1;
            self.find_next_spawner(manager);
        }
        self
    }

    fn advanced(mut self, manager: &EntityManager) -> Self {
        self.advance(manager);
        self
    }
}

impl<'s, Q: ComponentSet> Clone for SelectionCursor<'s, Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'s, Q: ComponentSet> Copy for SelectionCursor<'s, Q> {}

impl<'s, Q: ComponentSet> PartialEq for SelectionCursor<'s, Q> {
    fn eq(&self, other: &Self) -> bool {
        self.spawner == other.spawner && self.row == other.row
    }
}

impl<'s, Q: ComponentSet> Eq for SelectionCursor<'s, Q> {}

impl<'s, Q: ComponentSet> std::fmt::Debug for SelectionCursor<'s, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_end() {
            return f.write_str("SelectionCursor(end)");
        }
        f.debug_struct("SelectionCursor")
            .field("spawner", &self.spawner)
            .field("row", &self.row)
            .finish()
    }
}

struct Batch<'m, Q: ComponentSet> {
    entities: &'m [Entity],
    columns: Q::Columns<'m>,
}

/// Shared selection iterator
pub struct SelectionIter<'m, Q: ComponentSet> {
    batches: Vec<Batch<'m, Q>>,
    batch: usize,
    row: usize,
    remaining: usize,
}

impl<'m, Q: ComponentSet> Iterator for SelectionIter<'m, Q> {
    type Item = (Entity, Q::Refs<'m>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(batch) = self.batches.get(self.batch) {
            if self.row < batch.entities.len() {
                let row = self.row;
                self.row += 1;
                self.remaining -= 1;
                return Some((batch.entities[row], Q::fetch(&batch.columns, row)));
            }
            self.batch += 1;
            self.row = 0;
        }
        None
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let mut skip = n;
        while let Some(batch) = self.batches.get(self.batch) {
            let left = batch.entities.len().saturating_sub(self.row);
            if skip < left {
                self.row += skip;
                break;
            }
            skip -= left;
            self.batch += 1;
            self.row = 0;
        }
        self.remaining = self.remaining.saturating_sub(n);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'m, Q: ComponentSet> ExactSizeIterator for SelectionIter<'m, Q> {
    fn len(&self) -> usize {
        self.remaining
    }
}

struct BatchMut<Q: ComponentSet> {
    entities: *const Entity,
    len: usize,
    pointers: Q::Pointers,
}

/// Mutable selection iterator
///
/// Holds the manager mutably borrowed for `'m`, so no structural change can
/// happen while it is alive.
pub struct SelectionIterMut<'m, Q: ComponentSet> {
    batches: Vec<BatchMut<Q>>,
    batch: usize,
    row: usize,
    remaining: usize,
    _marker: PhantomData<&'m mut EntityManager>,
}

impl<'m, Q: ComponentSet> Iterator for SelectionIterMut<'m, Q> {
    type Item = (Entity, Q::Muts<'m>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(batch) = self.batches.get(self.batch) {
            if self.row < batch.len {
                let row = self.row;
                self.row += 1;
                self.remaining -= 1;
                // SAFETY:
                // 1. Pointers were taken from spawners borrowed mutably for 'm
                // 2. No spawner can grow or shrink while that borrow lives
                // 3. Each row is yielded once, so no two items alias
                // 4. A selection never names a type twice, so columns differ
                unsafe {
                    let entity = *batch.entities.add(row);
                    return Some((entity, Q::fetch_mut(&batch.pointers, row)));
                }
            }
            self.batch += 1;
            self.row = 0;
        }
        None
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let mut skip = n;
        while let Some(batch) = self.batches.get(self.batch) {
            let left = batch.len.saturating_sub(self.row);
            if skip < left {
                self.row += skip;
                break;
            }
            skip -= left;
            self.batch += 1;
            self.row = 0;
        }
        self.remaining = self.remaining.saturating_sub(n);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'m, Q: ComponentSet> ExactSizeIterator for SelectionIterMut<'m, Q> {
    fn len(&self) -> usize {
        self.remaining
    }
}
