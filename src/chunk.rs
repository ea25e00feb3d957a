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

//! Chunk: one contiguous, column-major memory block holding every entity of
//! a single archetype.
//!
//! The buffer is laid out column by column — every type's values for every
//! row, back to back — rather than row by row, so iterating a single
//! component type across a chunk is a linear scan with no stride.

use std::alloc::{alloc, alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

use crate::archetype::Archetype;
use crate::entity::{ChunkId, Entity, SlotHandle};
use crate::type_info::Component;

#[cfg(feature = "profiling")]
use tracing::info_span;

const INITIAL_CAPACITY: usize = 16;
const SHRINK_THRESHOLD_DIVISOR: usize = 3;
const GROWTH_FACTOR: usize = 2;

/// Sentinel row value a slot handle is set to once its entity stops owning a
/// row in this chunk, so a caller still holding that `Entity` can detect the
/// handle went stale instead of silently reading whatever row slid into its
/// old position.
pub(crate) const INVALID_ROW: usize = usize::MAX;

/// A single contiguous store for every entity sharing one archetype.
pub struct Chunk {
    id: ChunkId,
    archetype: Archetype,
    buffer: Option<NonNull<u8>>,
    capacity: usize,
    len: usize,
    slots: Vec<SlotHandle>,
    buffer_align: usize,
}

unsafe impl Send for Chunk {}
unsafe impl Sync for Chunk {}

impl Chunk {
    /// Create an empty chunk for `archetype`, allocating space for
    /// `initial_capacity` rows (at least 1).
    pub fn new(id: ChunkId, archetype: Archetype, initial_capacity: usize) -> Self {
        let capacity = initial_capacity.max(1);
        let align = archetype
            .types()
            .iter()
            .map(|t| t.align())
            .max()
            .unwrap_or(1);
        let mut chunk = Chunk {
            id,
            archetype,
            buffer: None,
            capacity: 0,
            len: 0,
            slots: Vec::new(),
            buffer_align: align,
        };
        chunk.buffer = chunk.allocate_buffer(capacity);
        chunk.capacity = capacity;
        chunk
    }

    fn layout_for(&self, capacity: usize) -> Option<Layout> {
        let size = self.archetype.row_size() * capacity;
        if size == 0 {
            return None;
        }
        Layout::from_size_align(size, self.buffer_align.max(1)).ok()
    }

    fn allocate_buffer(&self, capacity: usize) -> Option<NonNull<u8>> {
        let layout = self.layout_for(capacity)?;
        let ptr = unsafe { alloc_zeroed(layout) };
        Some(NonNull::new(ptr).expect("allocation failure"))
    }

    /// This chunk's id.
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// The archetype every row in this chunk shares.
    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this chunk holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current row capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn column_ptr(&self, type_index: usize) -> *mut u8 {
        let offset = self.archetype.type_offset(type_index, self.capacity);
        let base = self.buffer.expect("chunk buffer missing for non-empty archetype");
        unsafe { base.as_ptr().add(offset) }
    }

    /// Raw pointer to the start of component `T`'s column, or `None` if this
    /// chunk's archetype does not carry `T`.
    pub fn get_column<T: Component>(&self) -> Option<*const T> {
        let index = self.archetype.type_index::<T>()?;
        Some(self.column_ptr(index) as *const T)
    }

    /// Mutable raw pointer to the start of component `T`'s column.
    pub fn get_column_mut<T: Component>(&mut self) -> Option<*mut T> {
        let index = self.archetype.type_index::<T>()?;
        Some(self.column_ptr(index) as *mut T)
    }

    /// Read component `T` at `row`.
    pub fn get<T: Component>(&self, row: usize) -> Option<&T> {
        if row >= self.len {
            return None;
        }
        let ptr = self.get_column::<T>()?;
        Some(unsafe { &*ptr.add(row) })
    }

    /// Mutably borrow component `T` at `row`.
    pub fn get_mut<T: Component>(&mut self, row: usize) -> Option<&mut T> {
        if row >= self.len {
            return None;
        }
        let ptr = self.get_column_mut::<T>()?;
        Some(unsafe { &mut *ptr.add(row) })
    }

    /// Write component `T` at `row`.
    ///
    /// Rows start out zero-initialized bit patterns rather than valid
    /// `T` values, so this writes in place without dropping whatever bytes
    /// were there before — calling `set` is how a freshly allocated row
    /// gets its first value for each of its columns. Calling it again on an
    /// already-populated row overwrites the value without running its
    /// destructor; routes that mutate an existing value in place should go
    /// through [`Chunk::get_mut`] instead.
    pub fn set<T: Component>(&mut self, row: usize, value: T) -> Option<()> {
        if row >= self.len {
            return None;
        }
        let ptr = self.get_column_mut::<T>()?;
        unsafe { std::ptr::write(ptr.add(row), value) };
        Some(())
    }

    /// Allocate a new row at the end of this chunk, growing the buffer first
    /// if it is full. Returns the new entity handle; the row's bytes are
    /// zeroed but component values are not constructed — callers must
    /// immediately `set` every column before reading it back.
    pub fn allocate(&mut self) -> Entity {
        #[cfg(feature = "profiling")]
        let _span = info_span!("chunk_allocate", chunk_id = self.id).entered();

        if self.len == self.capacity {
            self.reallocate(self.capacity * GROWTH_FACTOR);
        }
        let row = self.len;
        self.len += 1;
        let entity = Entity::new(self.id, row);
        self.slots.push(entity.slot().clone());
        entity
    }

    /// Remove `row`, running drop glue on every column, shifting every
    /// following row down by one to keep storage contiguous, and rewriting
    /// the slot handle of every entity whose row moved.
    pub fn remove(&mut self, row: usize) {
        #[cfg(feature = "profiling")]
        let _span = info_span!("chunk_remove", chunk_id = self.id, row).entered();

        assert!(row < self.len, "row out of bounds");
        self.destroy_row(row);
        self.compact_after_remove(row);
        self.slots[row].set(INVALID_ROW);
        self.slots.remove(row);
        for slot in self.slots.iter().skip(row) {
            slot.set(slot.get() - 1);
        }
        self.len -= 1;
        self.maybe_shrink();
    }

    fn destroy_row(&mut self, row: usize) {
        for (index, ty) in self.archetype.types().iter().enumerate() {
            if !ty.needs_drop() {
                continue;
            }
            let ptr = self.column_ptr(index);
            unsafe {
                let elem = ptr.add(row * ty.size());
                ty.drop_at(elem);
            }
        }
    }

    fn compact_after_remove(&mut self, row: usize) {
        if row + 1 >= self.len {
            return;
        }
        let tail_rows = self.len - row - 1;
        for (index, ty) in self.archetype.types().iter().enumerate() {
            let size = ty.size();
            if size == 0 {
                continue;
            }
            let base = self.column_ptr(index);
            unsafe {
                let dst = base.add(row * size);
                let src = base.add((row + 1) * size);
                std::ptr::copy(src, dst, size * tail_rows);
            }
        }
    }

    fn maybe_shrink(&mut self) {
        if self.len > 0
            && self.len < self.capacity / SHRINK_THRESHOLD_DIVISOR
            && self.capacity > INITIAL_CAPACITY
        {
            self.reallocate(self.capacity / GROWTH_FACTOR);
        }
    }

    /// Reallocate the backing buffer to hold `new_capacity` rows, relocating
    /// every live row's bytes by a bitwise copy. Rust has no copy
    /// constructors to invoke during relocation, so every column is moved
    /// the same way regardless of the component type.
    fn reallocate(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(self.len).max(1);
        let new_buffer = self.allocate_buffer(new_capacity);

        if let (Some(old_buffer), Some(new_ptr)) = (self.buffer, new_buffer) {
            for (index, ty) in self.archetype.types().iter().enumerate() {
                let size = ty.size();
                if size == 0 {
                    continue;
                }
                let old_offset = self.archetype.type_offset(index, self.capacity);
                let new_offset = self.archetype.type_offset(index, new_capacity);
                unsafe {
                    let src = old_buffer.as_ptr().add(old_offset);
                    let dst = new_ptr.as_ptr().add(new_offset);
                    std::ptr::copy_nonoverlapping(src, dst, size * self.len);
                }
            }
            self.deallocate_buffer(old_buffer, self.capacity);
        }

        self.buffer = new_buffer;
        self.capacity = new_capacity;
    }

    fn deallocate_buffer(&self, buffer: NonNull<u8>, capacity: usize) {
        if let Some(layout) = self.layout_for(capacity) {
            unsafe { dealloc(buffer.as_ptr(), layout) };
        }
    }

    /// Move the entity at `row` into `dest`, copying columns the two
    /// archetypes share by hash, dropping columns present only in this
    /// chunk's archetype, then compacting this chunk's row out. Returns the
    /// new entity handle in `dest`.
    pub fn move_to(&mut self, row: usize, dest: &mut Chunk) -> Entity {
        assert!(row < self.len, "row out of bounds");
        debug_assert!(
            self.archetype
                .types()
                .iter()
                .any(|t| dest.archetype.has_hash(t.hash())),
            "move_to between archetypes sharing no columns (ArchetypeMismatch)"
        );
        let new_entity = dest.allocate();
        let dest_row = new_entity.row();

        for (src_index, ty) in self.archetype.types().iter().enumerate() {
            let size = ty.size();
            if size == 0 {
                continue;
            }
            match dest.archetype.type_index_by_hash(ty.hash()) {
                Some(dst_index) => {
                    let src_ptr = unsafe { self.column_ptr(src_index).add(row * size) };
                    let dst_ptr = unsafe { dest.column_ptr(dst_index).add(dest_row * size) };
                    unsafe { std::ptr::copy_nonoverlapping(src_ptr, dst_ptr, size) };
                }
                None => {
                    if ty.needs_drop() {
                        let ptr = unsafe { self.column_ptr(src_index).add(row * size) };
                        unsafe { ty.drop_at(ptr) };
                    }
                }
            }
        }

        self.compact_after_remove(row);
        self.slots[row].set(INVALID_ROW);
        self.slots.remove(row);
        for slot in self.slots.iter().skip(row) {
            slot.set(slot.get() - 1);
        }
        self.len -= 1;
        self.maybe_shrink();

        new_entity
    }

    fn cleanup(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            for row in 0..self.len {
                for (index, ty) in self.archetype.types().iter().enumerate() {
                    if !ty.needs_drop() {
                        continue;
                    }
                    let offset = self.archetype.type_offset(index, self.capacity);
                    unsafe {
                        let ptr = buffer.as_ptr().add(offset).add(row * ty.size());
                        ty.drop_at(ptr);
                    }
                }
            }
            self.deallocate_buffer(buffer, self.capacity);
        }
        self.len = 0;
    }

    /// Destruct every live row, free the buffer, and reset this chunk to an
    /// empty, reusable state at capacity 1. Unlike dropping the chunk, which
    /// releases the buffer for good, `clear` leaves the chunk ready to
    /// `allocate` into again. Every entity handle still pointing at a row in
    /// this chunk is invalidated.
    pub fn clear(&mut self) {
        self.cleanup();
        for slot in self.slots.drain(..) {
            slot.set(INVALID_ROW);
        }
        self.buffer = self.allocate_buffer(1);
        self.capacity = 1;
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        self.cleanup();
    }
}
