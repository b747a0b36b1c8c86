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

//! Error types
//!
//! Only recoverable conditions live here. Contract violations (advancing an
//! end cursor, reading a component a selection did not ask for, indexing a
//! pool out of range) panic instead.

use std::collections::TryReserveError;
use std::fmt;

/// ECS error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Handle was destroyed or never allocated
    EntityNotFound,

    /// Component type is not part of the entity's archetype
    ComponentNotFound,

    /// A mask names a component id the registry never handed out
    UnregisteredComponent(usize),

    /// Bulk spawn above the configured limit
    BatchTooLarge { requested: usize, max: usize },

    /// Storage could not be reserved; nothing was appended
    AllocationFailed { requested: usize },
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::EntityNotFound => write!(f, "Entity not found"),
            EcsError::ComponentNotFound => write!(f, "Component not found"),
            EcsError::UnregisteredComponent(id) => {
                write!(f, "Component id {id} is not registered")
            }
            EcsError::BatchTooLarge { requested, max } => {
                write!(f, "Batch size too large: requested {requested}, max is {max}")
            }
            EcsError::AllocationFailed { requested } => {
                write!(f, "Failed to reserve storage for {requested} entities")
            }
        }
    }
}

impl std::error::Error for EcsError {}

impl EcsError {
    pub(crate) fn allocation(requested: usize) -> impl FnOnce(TryReserveError) -> EcsError {
        move |_| EcsError::AllocationFailed { requested }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;
