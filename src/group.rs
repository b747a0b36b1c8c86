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

//! Self-refreshing selection

use crate::component::ComponentSet;
use crate::entity::Entity;
use crate::manager::EntityManager;
use crate::mask::ComponentMask;
use crate::selection::{Selection, SelectionCursor, SelectionIter, SelectionIterMut};

/// Selection that catches up with new spawners before every pass
pub struct Group<Q: ComponentSet = ()> {
    selection: Selection<Q>,
}

impl<Q: ComponentSet> Group<Q> {
    /// Create group and register every existing matching spawner
    pub fn new(manager: &EntityManager) -> Self {
        Self::excluding(manager, ComponentMask::new())
    }

    pub fn excluding(manager: &EntityManager, unwanted: ComponentMask) -> Self {
        let mut selection = Selection::excluding(unwanted);
        manager.update_selection(&mut selection);
        Self { selection }
    }

    /// Register spawners created since the last pass
    pub fn refresh(&mut self, manager: &EntityManager) -> usize {
        manager.update_selection(&mut self.selection)
    }

    /// Underlying selection, as of the last refresh
    pub fn selection(&self) -> &Selection<Q> {
        &self.selection
    }

    pub fn count_entities(&mut self, manager: &EntityManager) -> usize {
        self.refresh(manager);
        self.selection.count_entities(manager)
    }

    /// Refresh, then return a cursor at the first entity
    pub fn begin(&mut self, manager: &EntityManager) -> SelectionCursor<'_, Q> {
        self.refresh(manager);
        self.selection.begin(manager)
    }

    /// Iterate (refreshes automatically)
    pub fn iter<'m>(&mut self, manager: &'m EntityManager) -> SelectionIter<'m, Q> {
        self.refresh(manager);
        self.selection.iter(manager)
    }

    /// Iterate mutably (refreshes automatically)
    pub fn iter_mut<'m>(&mut self, manager: &'m mut EntityManager) -> SelectionIterMut<'m, Q> {
        self.refresh(manager);
        self.selection.iter_mut(manager)
    }

    pub fn for_each<'m, F>(&mut self, manager: &'m mut EntityManager, func: F)
    where
        F: FnMut(Entity, Q::Muts<'m>),
    {
        self.refresh(manager);
        self.selection.for_each(manager, func);
    }
}
