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

//! Archetype ECS - an archetype-based entity-component-system storage and
//! dispatch engine.
//!
//! Entities are grouped by the exact set of component types they carry
//! (their [`Archetype`]), and every archetype's rows live column-wise in a
//! dense, contiguous [`Chunk`] for cache-friendly batch iteration. A
//! [`World`] owns the chunks for one scene, routes entity creation,
//! destruction, and component read/write to the chunk that owns a given
//! [`Entity`], runs [`System`]s in priority order, and exposes `for_each`
//! queries (sequential or data-parallel) over one or several component
//! types at once.

pub mod archetype;
pub mod chunk;
pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod system;
pub mod type_info;
pub mod utils;
pub mod world;

pub use archetype::Archetype;
pub use chunk::Chunk;
pub use component::Bundle;
pub use entity::{ChunkId, Entity};
pub use error::{EcsError, Result};
pub use system::{System, SystemControl};
pub use type_info::{Component, TypeInfo, MAX_TYPES};
pub use world::{Application, NullApplication, World};
