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

//! Component trait, component registry and component sets
//!
//! Every component type gets a dense [`ComponentId`] on first use. The id is
//! the bit position of the type in a [`ComponentMask`] and stays fixed for the
//! lifetime of the process.
//!
//! [`ComponentSet`] is implemented for `()` and tuples of up to eight
//! components. It names the wanted columns of a selection, the component
//! list of an archetype, and the values of a spawned bundle.

use std::any::TypeId;
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

use crate::mask::ComponentMask;
use crate::pool::{ErasedPool, Pool};
use crate::spawner::EntitySpawner;

/// Maximum number of components in a [`ComponentSet`] tuple
pub const MAX_SET_COMPONENTS: usize = 8;

/// Marker trait for components
///
/// Components are owned plain data. `Default` is required because spawning
/// into an archetype and growing an entity's archetype default-initialize
/// the new slots.
pub trait Component: 'static + Send + Sync + Default {}

impl<T: 'static + Send + Sync + Default> Component for T {}

/// Dense per-type id, used as a bit position in masks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentId(u32);

impl ComponentId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Registration data for a component type
#[derive(Clone, Copy, Debug)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub type_id: TypeId,
    pub name: &'static str,
    new_pool: fn() -> Box<dyn ErasedPool>,
}

impl ComponentInfo {
    /// Empty pool for this component type
    pub fn new_pool(&self) -> Box<dyn ErasedPool> {
        (self.new_pool)()
    }
}

fn new_pool<T: Component>() -> Box<dyn ErasedPool> {
    Box::new(Pool::<T>::new())
}

/// Process-wide component registry
#[derive(Default)]
pub struct ComponentRegistry {
    ids: FxHashMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
}

fn registry() -> &'static RwLock<ComponentRegistry> {
    static REGISTRY: OnceLock<RwLock<ComponentRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(ComponentRegistry::default()))
}

impl ComponentRegistry {
    /// Id of `T`, registering it on first use
    pub fn id_of<T: Component>() -> ComponentId {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = registry().read().ids.get(&type_id) {
            return id;
        }

        let mut registry = registry().write();
        // Another thread may have registered T between the two locks
        if let Some(&id) = registry.ids.get(&type_id) {
            return id;
        }

        let id = ComponentId::from_index(registry.infos.len());
        registry.infos.push(ComponentInfo {
            id,
            type_id,
            name: std::any::type_name::<T>(),
            new_pool: new_pool::<T>,
        });
        registry.ids.insert(type_id, id);

        #[cfg(feature = "profiling")]
        tracing::debug!(
            component = std::any::type_name::<T>(),
            id = id.index(),
            "registered component"
        );

        id
    }

    /// Id of an already registered type
    pub fn lookup(type_id: TypeId) -> Option<ComponentId> {
        registry().read().ids.get(&type_id).copied()
    }

    /// Registration data of `id`
    pub fn info(id: ComponentId) -> Option<ComponentInfo> {
        registry().read().infos.get(id.index()).copied()
    }

    /// Number of registered component types
    pub fn registered_count() -> usize {
        registry().read().infos.len()
    }
}

/// Compile-time set of component types
///
/// The typed half of the dual pool access: `columns`/`pointers` resolve the
/// pools of one spawner once from precomputed slots, and `fetch`/`fetch_mut`
/// index into them per row without any further lookup.
pub trait ComponentSet: 'static {
    /// Shared references to one row
    type Refs<'a>;
    /// Mutable references to one row
    type Muts<'a>;
    /// Shared column slices of one spawner
    type Columns<'a>: Copy;
    /// Raw column base pointers of one spawner
    type Pointers: Copy;

    /// Ids of the set, in declaration order
    fn component_ids() -> SmallVec<[ComponentId; MAX_SET_COMPONENTS]>;

    /// Mask of the set
    fn mask() -> ComponentMask {
        Self::component_ids().into_iter().collect()
    }

    /// Whether every type of the set is named once
    fn is_distinct() -> bool {
        let ids = Self::component_ids();
        ids.iter().copied().collect::<ComponentMask>().count() == ids.len()
    }

    /// Column slices of `spawner`, `slots` being the pool slot of each type
    fn columns<'a>(spawner: &'a EntitySpawner, slots: &[usize]) -> Self::Columns<'a>;

    /// References to `row` of previously resolved columns
    ///
    /// # Panics
    /// Panics if `row` is out of range.
    fn fetch<'a>(columns: &Self::Columns<'a>, row: usize) -> Self::Refs<'a>;

    /// Column base pointers of `spawner`
    fn pointers(spawner: &mut EntitySpawner, slots: &[usize]) -> Self::Pointers;

    /// Mutable references to `row` of previously resolved columns
    ///
    /// # Safety
    /// - `pointers` must come from a spawner that is still alive and has not
    ///   been resized since
    /// - `row` must be in range
    /// - no other reference to the same row may be alive
    unsafe fn fetch_mut<'a>(pointers: &Self::Pointers, row: usize) -> Self::Muts<'a>;

    /// Overwrite `row` of `spawner` with the values of this bundle
    fn write(self, spawner: &mut EntitySpawner, row: usize)
    where
        Self: Sized;
}

impl ComponentSet for () {
    type Refs<'a> = ();
    type Muts<'a> = ();
    type Columns<'a> = ();
    type Pointers = ();

    fn component_ids() -> SmallVec<[ComponentId; MAX_SET_COMPONENTS]> {
        SmallVec::new()
    }

    fn columns<'a>(_spawner: &'a EntitySpawner, _slots: &[usize]) -> Self::Columns<'a> {}

    fn fetch<'a>(_columns: &Self::Columns<'a>, _row: usize) -> Self::Refs<'a> {}

    fn pointers(_spawner: &mut EntitySpawner, _slots: &[usize]) -> Self::Pointers {}

    unsafe fn fetch_mut<'a>(_pointers: &Self::Pointers, _row: usize) -> Self::Muts<'a> {}

    fn write(self, _spawner: &mut EntitySpawner, _row: usize) {}
}

macro_rules! impl_component_set {
    ($($T:ident),*) => {
        impl<$($T: Component),*> ComponentSet for ($($T,)*) {
            type Refs<'a> = ($(&'a $T,)*);
            type Muts<'a> = ($(&'a mut $T,)*);
            type Columns<'a> = ($(&'a [$T],)*);
            type Pointers = ($(*mut $T,)*);

            fn component_ids() -> SmallVec<[ComponentId; MAX_SET_COMPONENTS]> {
                smallvec![$(ComponentRegistry::id_of::<$T>()),*]
            }

            #[allow(unused_assignments)]
            fn columns<'a>(spawner: &'a EntitySpawner, slots: &[usize]) -> Self::Columns<'a> {
                let mut i = 0;
                ($({
                    let column = spawner.pool_at::<$T>(slots[i]).as_slice();
                    i += 1;
                    column
                },)*)
            }

            #[allow(non_snake_case)]
            fn fetch<'a>(columns: &Self::Columns<'a>, row: usize) -> Self::Refs<'a> {
                let ($($T,)*) = *columns;
                ($(&$T[row],)*)
            }

            #[allow(unused_assignments)]
            fn pointers(spawner: &mut EntitySpawner, slots: &[usize]) -> Self::Pointers {
                let mut i = 0;
                ($({
                    let ptr = spawner.pool_at_mut::<$T>(slots[i]).as_mut_ptr();
                    i += 1;
                    ptr
                },)*)
            }

            #[allow(non_snake_case)]
            unsafe fn fetch_mut<'a>(pointers: &Self::Pointers, row: usize) -> Self::Muts<'a> {
                let ($($T,)*) = *pointers;
                ($(&mut *$T.add(row),)*)
            }

            #[allow(non_snake_case)]
            fn write(self, spawner: &mut EntitySpawner, row: usize) {
                let ($($T,)*) = self;
                $(
                    if let Some(pool) = spawner.pool_mut::<$T>() {
                        pool[row] = $T;
                    }
                )*
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
