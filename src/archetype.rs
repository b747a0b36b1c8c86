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

//! Archetype descriptors
//!
//! An archetype is identified by its component mask alone. It owns no data;
//! the manager uses it to find or create the matching spawner.

use crate::component::{Component, ComponentRegistry, ComponentSet};
use crate::mask::ComponentMask;

/// Unique combination of component types
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Archetype {
    mask: ComponentMask,
}

impl Archetype {
    /// Archetype with no components
    pub fn empty() -> Self {
        Self::default()
    }

    /// Archetype made of the components of `S`
    pub fn of<S: ComponentSet>() -> Self {
        Self { mask: S::mask() }
    }

    pub fn from_mask(mask: ComponentMask) -> Self {
        Self { mask }
    }

    /// Copy with `T` added
    #[must_use]
    pub fn with<T: Component>(&self) -> Self {
        let mut mask = self.mask.clone();
        mask.insert(ComponentRegistry::id_of::<T>());
        Self { mask }
    }

    /// Copy with `T` removed
    #[must_use]
    pub fn without<T: Component>(&self) -> Self {
        let mut mask = self.mask.clone();
        mask.remove(ComponentRegistry::id_of::<T>());
        Self { mask }
    }

    pub fn has<T: Component>(&self) -> bool {
        self.mask.has(ComponentRegistry::id_of::<T>())
    }

    pub fn mask(&self) -> &ComponentMask {
        &self.mask
    }

    /// Number of component types
    pub fn len(&self) -> usize {
        self.mask.count()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }
}

impl From<ComponentMask> for Archetype {
    fn from(mask: ComponentMask) -> Self {
        Self { mask }
    }
}
