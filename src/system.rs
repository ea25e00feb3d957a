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

//! System trait: logic dispatched against a [`World`](crate::world::World) in
//! priority order.
//!
//! Unlike a design where each system keeps a back-pointer to the world that
//! owns it, `on_init`/`on_update`/`on_end` here receive `&mut World<A>` as an
//! argument every time the world calls them. A system that needs to change
//! scenes, request shutdown, or reach the shared `Common` value just calls
//! the corresponding method on that borrow.

use crate::world::{Application, World};

/// Logic run once per dispatch tick, in ascending priority order.
pub trait System<A: Application> {
    /// Called once when this system is added to an already-running world, or
    /// when the world's own `init` runs.
    fn on_init(&mut self, _world: &mut World<A>) {}

    /// Called once per `World::update`.
    fn on_update(&mut self, world: &mut World<A>) -> SystemControl;

    /// Called once when the world ends.
    fn on_end(&mut self, _world: &mut World<A>) {}
}

/// Returned from [`System::on_update`] to say whether this system keeps
/// running next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemControl {
    /// Keep this system in the world's system list.
    Continue,
    /// Run `on_end` and drop this system after the current tick.
    RemoveSelf,
}

/// One system plus the priority it was registered with. Lower priority runs
/// first; priority is owned by the world's system list, not requeried from
/// the system.
pub(crate) struct SystemSlot<A: Application> {
    pub priority: i32,
    pub system: Box<dyn System<A>>,
}
