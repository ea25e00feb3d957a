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

//! World: the dispatcher that owns every chunk and every system for one
//! scene, and the sole entry point application code goes through to create
//! entities, read/write components, run queries, and drive systems.

use std::collections::BTreeMap;
use std::ptr::NonNull;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::chunk::{Chunk, INVALID_ROW};
use crate::component::Bundle;
use crate::entity::{ChunkId, Entity};
use crate::error::{EcsError, Result};
use crate::query;
use crate::system::{System, SystemControl, SystemSlot};
use crate::type_info::Component;

/// The minimal external collaborator the core invokes through: the outer
/// scene switcher / application object. Out of scope for this crate (see
/// the module-level spec this crate implements), bound only through these
/// three operations.
pub trait Application {
    /// Key type identifying a scene to switch to.
    type Key;
    /// Cross-world shared-state object the application hands back by
    /// reference.
    type Common;

    /// Request a scene change.
    fn change(&mut self, key: Self::Key, reset: bool);

    /// Request global shutdown.
    fn dispatch_end(&mut self);

    /// Fetch the cross-world shared-state object.
    fn common(&mut self) -> &mut Self::Common;
}

/// A do-nothing `Application` so a `World` is constructible and testable
/// standalone, without a surrounding scene switcher.
#[derive(Debug, Default)]
pub struct NullApplication {
    common: (),
    ended: bool,
}

impl NullApplication {
    pub fn new() -> Self {
        NullApplication {
            common: (),
            ended: false,
        }
    }

    /// Whether `dispatch_end` has been called.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl Application for NullApplication {
    type Key = ();
    type Common = ();

    fn change(&mut self, _key: (), _reset: bool) {}

    fn dispatch_end(&mut self) {
        self.ended = true;
    }

    fn common(&mut self) -> &mut () {
        &mut self.common
    }
}

/// Owns every chunk (keyed by chunk id, ascending) and every system
/// (ordered by ascending priority) for one scene.
pub struct World<A: Application = NullApplication> {
    chunks: BTreeMap<ChunkId, Chunk>,
    next_chunk_id: ChunkId,
    systems: Vec<SystemSlot<A>>,
    initialized: bool,
    application: Option<NonNull<A>>,
}

impl<A: Application> World<A> {
    /// An empty world with no chunks, no systems, and no bound application.
    pub fn new() -> Self {
        World {
            chunks: BTreeMap::new(),
            next_chunk_id: 0,
            systems: Vec::new(),
            initialized: false,
            application: None,
        }
    }

    /// Bind the external application collaborator this world invokes
    /// `change`/`end_all`/`common` through.
    ///
    /// # Safety-relevant contract
    /// The referent must outlive every subsequent call this world makes
    /// into it; the world holds only a raw pointer, mirroring how the
    /// source stores a non-owning `Application*` inside `World`.
    pub fn bind_application(&mut self, app: &mut A) {
        self.application = Some(NonNull::from(app));
    }

    /// Request a scene change on the bound application, if any is bound.
    pub fn change(&mut self, key: A::Key, reset: bool) {
        if let Some(mut ptr) = self.application {
            unsafe { ptr.as_mut().change(key, reset) };
        }
    }

    /// Request global shutdown on the bound application, if any is bound.
    pub fn end_all(&mut self) {
        if let Some(mut ptr) = self.application {
            unsafe { ptr.as_mut().dispatch_end() };
        }
    }

    /// Borrow the bound application's shared `Common` value, if one is
    /// bound.
    pub fn common(&mut self) -> Option<&mut A::Common> {
        self.application
            .map(|mut ptr| unsafe { ptr.as_mut().common() })
    }

    /// Number of chunks currently backing this world.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of live rows across every chunk.
    pub fn entity_count(&self) -> usize {
        self.chunks.values().map(Chunk::len).sum()
    }

    // ---- entity lifecycle --------------------------------------------

    /// Create an entity with the component types named by `B`, with an
    /// initial chunk capacity of `reserve` if a new chunk must be created
    /// for this archetype. Returns a handle to a fresh row left
    /// uninitialized — every component named by `B` must be populated with
    /// [`World::set`] before it is read.
    pub fn create_entity<B: Bundle>(&mut self, reserve: usize) -> Result<Entity> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("world.create_entity", chunks = self.chunks.len()).entered();

        let archetype = crate::archetype::Archetype::create::<B>()?;
        if let Some(chunk) = self
            .chunks
            .values_mut()
            .find(|c| c.archetype().same_types(&archetype))
        {
            return Ok(chunk.allocate());
        }

        let id = self.next_chunk_id;
        self.next_chunk_id += 1;
        let mut chunk = Chunk::new(id, archetype, reserve.max(1));
        let entity = chunk.allocate();
        self.chunks.insert(id, chunk);
        Ok(entity)
    }

    /// Destroy `entity`, freeing its row for reuse and compacting its
    /// owning chunk.
    pub fn destroy_entity(&mut self, entity: &Entity) -> Result<()> {
        let row = Self::live_row(entity)?;
        let chunk = self
            .chunks
            .get_mut(&entity.chunk_id())
            .ok_or(EcsError::UnknownChunk)?;
        if row >= chunk.len() {
            return Err(EcsError::InvalidEntity);
        }
        chunk.remove(row);
        Ok(())
    }

    /// Read component `T` on `entity`.
    pub fn get<T: Component>(&self, entity: &Entity) -> Result<&T> {
        let row = Self::live_row(entity)?;
        let chunk = self
            .chunks
            .get(&entity.chunk_id())
            .ok_or(EcsError::UnknownChunk)?;
        chunk.get::<T>(row).ok_or(EcsError::MissingComponent)
    }

    /// Write component `T` on `entity`.
    pub fn set<T: Component>(&mut self, entity: &Entity, value: T) -> Result<()> {
        let row = Self::live_row(entity)?;
        let chunk = self
            .chunks
            .get_mut(&entity.chunk_id())
            .ok_or(EcsError::UnknownChunk)?;
        chunk.set::<T>(row, value).ok_or(EcsError::MissingComponent)
    }

    /// Mutably borrow component `T` on `entity`, to edit an already-written
    /// value in place without re-supplying the whole value.
    pub fn get_mut<T: Component>(&mut self, entity: &Entity) -> Result<&mut T> {
        let row = Self::live_row(entity)?;
        let chunk = self
            .chunks
            .get_mut(&entity.chunk_id())
            .ok_or(EcsError::UnknownChunk)?;
        chunk.get_mut::<T>(row).ok_or(EcsError::MissingComponent)
    }

    fn live_row(entity: &Entity) -> Result<usize> {
        let row = entity.row();
        if row == INVALID_ROW {
            Err(EcsError::InvalidEntity)
        } else {
            Ok(row)
        }
    }

    // ---- queries -------------------------------------------------------

    /// Visit every entity whose archetype is a superset of `(T1,)`, in
    /// ascending (chunk-id, row) order.
    pub fn for_each1<T1: Component>(&mut self, mut f: impl FnMut(&mut T1)) -> Result<()> {
        query::for_each1(&mut self.chunks, &mut f)
    }

    /// Visit every entity whose archetype is a superset of `(T1, T2)`.
    pub fn for_each2<T1: Component, T2: Component>(
        &mut self,
        mut f: impl FnMut(&mut T1, &mut T2),
    ) -> Result<()> {
        query::for_each2(&mut self.chunks, &mut f)
    }

    /// Visit every entity whose archetype is a superset of `(T1, T2, T3)`.
    pub fn for_each3<T1: Component, T2: Component, T3: Component>(
        &mut self,
        mut f: impl FnMut(&mut T1, &mut T2, &mut T3),
    ) -> Result<()> {
        query::for_each3(&mut self.chunks, &mut f)
    }

    /// Visit every entity whose archetype is a superset of
    /// `(T1, T2, T3, T4)`.
    pub fn for_each4<T1: Component, T2: Component, T3: Component, T4: Component>(
        &mut self,
        mut f: impl FnMut(&mut T1, &mut T2, &mut T3, &mut T4),
    ) -> Result<()> {
        query::for_each4(&mut self.chunks, &mut f)
    }

    /// Visit every live row of every chunk carrying `T`, partitioned into 4
    /// contiguous row ranges run on separate worker threads. Shorthand for
    /// [`World::for_each_parallel_n`] with the spec's default worker count.
    pub fn for_each_parallel<T: Component>(&mut self, f: impl Fn(&mut T) + Sync) -> Result<()> {
        self.for_each_parallel_n(4, f)
    }

    /// Visit every live row of every chunk carrying `T`, partitioned into
    /// `workers` contiguous row ranges run on separate worker threads (via
    /// `rayon` when the `parallel` feature is enabled; sequentially
    /// otherwise). `f` must be safe to call concurrently on disjoint rows:
    /// it may only touch the `T` value it is given. Workers complete before
    /// this call returns.
    pub fn for_each_parallel_n<T: Component>(
        &mut self,
        workers: usize,
        f: impl Fn(&mut T) + Sync,
    ) -> Result<()> {
        query::for_each_parallel::<T, _>(&mut self.chunks, workers, &f)
    }

    // ---- systems ---------------------------------------------------------

    /// Register `system` at `priority` (lower runs earlier). If this world
    /// has already been `init`ialized, `on_init` runs on `system`
    /// immediately, before it is inserted into the list.
    pub fn add_system<S: System<A> + 'static>(&mut self, system: S, priority: i32) {
        let mut boxed: Box<dyn System<A>> = Box::new(system);
        if self.initialized {
            boxed.on_init(self);
        }
        let idx = self.systems.partition_point(|slot| slot.priority <= priority);
        self.systems.insert(idx, SystemSlot { priority, system: boxed });
    }

    /// Mark this world initialized and run `on_init` on every system in
    /// ascending priority order.
    pub fn init(&mut self) {
        self.initialized = true;
        let mut i = 0;
        while i < self.systems.len() {
            let mut slot = self.systems.remove(i);
            slot.system.on_init(self);
            self.systems.insert(i, slot);
            i += 1;
        }
    }

    /// Run `on_update` on every system in the priority-ordered snapshot
    /// taken at the start of this call. A system returning
    /// `SystemControl::RemoveSelf` has `on_end` run on it and is dropped
    /// before the next system in the snapshot runs; systems added via
    /// `add_system` during this pass are deferred to the next `update`.
    pub fn update(&mut self) {
        #[cfg(feature = "profiling")]
        let _span = info_span!("world.update", systems = self.systems.len()).entered();

        let mut pass = std::mem::take(&mut self.systems);
        let mut i = 0;
        while i < pass.len() {
            let control = pass[i].system.on_update(self);
            if control == SystemControl::RemoveSelf {
                let mut removed = pass.remove(i);
                removed.system.on_end(self);
            } else {
                i += 1;
            }
        }

        let mut merged = pass;
        for added in std::mem::take(&mut self.systems) {
            let idx = merged.partition_point(|slot| slot.priority <= added.priority);
            merged.insert(idx, added);
        }
        self.systems = merged;
    }

    /// Run `on_end` on every system in ascending priority order, then
    /// destroy every chunk (running drop glue on every remaining row).
    pub fn end(&mut self) {
        let mut pass = std::mem::take(&mut self.systems);
        for slot in pass.iter_mut() {
            slot.system.on_end(self);
        }
        self.systems = pass;
        self.chunks.clear();
    }
}

impl<A: Application> Default for World<A> {
    fn default() -> Self {
        Self::new()
    }
}
