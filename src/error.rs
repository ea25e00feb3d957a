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
//! Every variant here is a programmer-error condition (a stale handle, a
//! type absent from an archetype, too many component types on one entity).
//! None of them represent a transient runtime failure, so none are retried.

use std::fmt;

/// ECS error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// An archetype or bundle named more component types than `MAX_TYPES` allows.
    TooManyTypes { count: usize },

    /// The same component type hash appeared twice in one archetype/bundle.
    DuplicateType { hash: u32 },

    /// The requested component type is not part of the entity's archetype.
    MissingComponent,

    /// An entity handle referenced a chunk id the world no longer has.
    UnknownChunk,

    /// The entity handle's slot no longer points at a live row.
    InvalidEntity,

    /// The source and destination archetypes are incompatible for this operation.
    ArchetypeMismatch,
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::TooManyTypes { count } => {
                write!(f, "too many component types: {count}")
            }
            EcsError::DuplicateType { hash } => {
                write!(f, "duplicate component type hash: {hash:#x}")
            }
            EcsError::MissingComponent => write!(f, "component not present in archetype"),
            EcsError::UnknownChunk => write!(f, "unknown chunk id"),
            EcsError::InvalidEntity => write!(f, "invalid or stale entity handle"),
            EcsError::ArchetypeMismatch => write!(f, "archetype mismatch"),
        }
    }
}

impl std::error::Error for EcsError {}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;
