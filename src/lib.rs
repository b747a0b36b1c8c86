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

//! Spawner ECS - archetype storage with spawners and selections
//!
//! Entities of the same archetype live in one spawner as index-aligned
//! pools. Selections walk every matching spawner without per-entity lookups.

pub mod archetype;
pub mod component;
pub mod debug;
pub mod entity;
pub mod error;
pub mod group;
pub mod manager;
pub mod mask;
pub mod pool;
pub mod prelude;
pub mod selection;
pub mod spawner;

#[cfg(test)]
mod tests;

pub use archetype::*;
pub use component::*;
pub use entity::*;
pub use error::*;
pub use group::*;
pub use manager::*;
pub use mask::*;
pub use pool::*;
pub use selection::*;
pub use spawner::*;
