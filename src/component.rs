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

//! Bundle: a type-only tuple naming the component set a new entity is
//! created with.
//!
//! A `Bundle` names types, never values — `World::create_entity::<B>()`
//! allocates a row shaped for `B`'s types, left uninitialized, to be filled
//! in afterward with `World::set`.

use smallvec::SmallVec;

use crate::type_info::{Component, TypeInfo, MAX_TYPES};

/// A tuple of component types naming the shape of a newly created entity.
pub trait Bundle: 'static {
    /// The `TypeInfo` for every component type in this bundle, unsorted and
    /// possibly containing duplicates — `Archetype::from_types` validates.
    fn type_infos() -> SmallVec<[TypeInfo; MAX_TYPES]>;
}

impl Bundle for () {
    fn type_infos() -> SmallVec<[TypeInfo; MAX_TYPES]> {
        SmallVec::new()
    }
}

macro_rules! impl_bundle {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            fn type_infos() -> SmallVec<[TypeInfo; MAX_TYPES]> {
                let mut infos = SmallVec::new();
                $(infos.push(TypeInfo::of::<$T>());)+
                infos
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);
impl_bundle!(A, B, C, D, E, F, G, H, I);
impl_bundle!(A, B, C, D, E, F, G, H, I, J);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K, L);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K, L, M);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K, L, M, N);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K, L, M, N, O);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P);
