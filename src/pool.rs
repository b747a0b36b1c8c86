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

//! Contiguous single-type pools with swap-and-pop removal
//!
//! Indices into a pool are dense (`0..len`) and unstable across removals:
//! removing index `i` moves the last element into `i`.
//!
//! Out-of-range access through `Index`/`IndexMut`, `swap_remove` and the
//! erased operations panics in every build profile.

use std::any::Any;
use std::collections::TryReserveError;
use std::ops::{Index, IndexMut, Range};

use crate::component::Component;

/// Typed component pool
#[derive(Debug, Clone)]
pub struct Pool<T> {
    data: Vec<T>,
}

impl<T> Pool<T> {
    /// Create empty pool
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create pool with room for `capacity` elements
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Append value and return its index
    pub fn push(&mut self, value: T) -> usize {
        let index = self.data.len();
        self.data.push(value);
        index
    }

    /// Swap-and-pop removal
    ///
    /// Returns the former index of the element that now occupies `index`,
    /// or `None` if `index` was the last element.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) -> Option<usize> {
        self.take(index).1
    }

    /// Swap-and-pop removal returning the removed value as well
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn take(&mut self, index: usize) -> (T, Option<usize>) {
        assert!(
            index < self.data.len(),
            "pool index {index} out of range (len {})",
            self.data.len()
        );
        let last = self.data.len() - 1;
        let value = self.data.swap_remove(index);
        (value, (index != last).then_some(last))
    }

    /// Reserve space for `additional` elements without changing the length
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    /// Fallible variant of [`Pool::reserve`]
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.data.try_reserve(additional)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.data.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Drop every element, keeping the allocation
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Move every element out, keeping the allocation
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.data.drain(..)
    }
}

impl<T: Default> Pool<T> {
    /// Append `count` default values and return their index range
    pub fn grow_default(&mut self, count: usize) -> Range<usize> {
        let start = self.data.len();
        self.data.resize_with(start + count, T::default);
        start..start + count
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for Pool<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for Pool<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<'a, T> IntoIterator for &'a Pool<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// Runtime-typed view of a [`Pool`]
///
/// Spawners hold their component pools behind this trait so that archetypes
/// unknown at compile time can still be spawned, resized and moved between.
pub trait ErasedPool: Any + Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Size of one element in bytes
    fn item_size(&self) -> usize;

    fn reserve(&mut self, additional: usize);

    fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError>;

    /// Append `count` default-initialized elements
    fn grow_default(&mut self, count: usize);

    /// Swap-and-pop, dropping the removed value
    fn swap_remove_at(&mut self, index: usize);

    /// Swap-and-pop the element at `index` and append it to `dst`
    ///
    /// # Panics
    /// Panics if `dst` holds a different element type.
    fn move_into(&mut self, index: usize, dst: &mut dyn ErasedPool);

    fn clear(&mut self);

    /// Fresh empty pool of the same element type
    fn new_empty(&self) -> Box<dyn ErasedPool>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for Pool<T> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn capacity(&self) -> usize {
        self.data.capacity()
    }

    fn item_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.data.try_reserve(additional)
    }

    fn grow_default(&mut self, count: usize) {
        Pool::grow_default(self, count);
    }

    fn swap_remove_at(&mut self, index: usize) {
        self.take(index);
    }

    fn move_into(&mut self, index: usize, dst: &mut dyn ErasedPool) {
        let (value, _) = self.take(index);
        match dst.as_any_mut().downcast_mut::<Pool<T>>() {
            Some(dst) => {
                dst.push(value);
            }
            None => panic!(
                "pool element type mismatch while moving {}",
                std::any::type_name::<T>()
            ),
        }
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn new_empty(&self) -> Box<dyn ErasedPool> {
        Box::new(Pool::<T>::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
