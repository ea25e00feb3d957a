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

//! Entity handles.
//!
//! An entity handle names a chunk and a row within it. The row is stored in
//! a shared, mutable cell rather than copied into the handle, so every clone
//! of a handle keeps seeing the entity's current row after the owning chunk
//! compacts rows during removal.

use std::cell::Cell;
use std::rc::Rc;

/// Identifies one chunk within a world.
pub type ChunkId = u64;

/// A shared, rewritable row index. The chunk holding this entity updates the
/// cell in place whenever compaction shifts the row.
pub type SlotHandle = Rc<Cell<usize>>;

/// A handle to one entity's storage location.
///
/// Cloning an `Entity` is cheap and all clones observe the same row, since
/// they share the same `SlotHandle` cell.
#[derive(Clone)]
pub struct Entity {
    chunk_id: ChunkId,
    slot: SlotHandle,
}

impl Entity {
    pub(crate) fn new(chunk_id: ChunkId, row: usize) -> Self {
        Entity {
            chunk_id,
            slot: Rc::new(Cell::new(row)),
        }
    }

    /// The chunk this entity currently lives in.
    pub fn chunk_id(&self) -> ChunkId {
        self.chunk_id
    }

    /// The entity's current row within its chunk.
    pub fn row(&self) -> usize {
        self.slot.get()
    }

    pub(crate) fn slot(&self) -> &SlotHandle {
        &self.slot
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.chunk_id == other.chunk_id && Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl Eq for Entity {}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("chunk_id", &self.chunk_id)
            .field("row", &self.row())
            .finish()
    }
}
