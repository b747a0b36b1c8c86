//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use spawner_ecs::prelude::*;
//! ```

pub use crate::archetype::Archetype;
pub use crate::component::{Component, ComponentSet};
pub use crate::debug::{ManagerInspector, ManagerStats, SpawnerInfo};
pub use crate::entity::Entity;
pub use crate::error::{EcsError, Result};
pub use crate::group::Group;
pub use crate::manager::{EntityCursor, EntityManager, ManagerConfig};
pub use crate::mask::ComponentMask;
pub use crate::selection::Selection;
