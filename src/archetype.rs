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

//! Archetype: a sorted, bounded set of component types describing one chunk's
//! row layout.

use smallvec::SmallVec;

use crate::component::Bundle;
use crate::error::{EcsError, Result};
use crate::type_info::{Component, TypeInfo, MAX_TYPES};

/// A component-type signature shared by every entity stored in one chunk.
///
/// Types are kept sorted in descending hash order so two archetypes built
/// from the same type set, specified in any order, compare equal and hash
/// identically.
#[derive(Clone)]
pub struct Archetype {
    types: SmallVec<[TypeInfo; MAX_TYPES]>,
    row_size: usize,
}

impl Archetype {
    /// Build an archetype from an arbitrary iterator of `TypeInfo`, sorting
    /// and validating it.
    pub fn from_types<I: IntoIterator<Item = TypeInfo>>(types: I) -> Result<Self> {
        let mut types: SmallVec<[TypeInfo; MAX_TYPES]> = types.into_iter().collect();
        if types.len() > MAX_TYPES {
            return Err(EcsError::TooManyTypes { count: types.len() });
        }
        types.sort_by(|a, b| b.hash().cmp(&a.hash()));
        for pair in types.windows(2) {
            if pair[0].hash() == pair[1].hash() {
                return Err(EcsError::DuplicateType { hash: pair[0].hash() });
            }
        }
        let row_size = types.iter().map(TypeInfo::size).sum();
        Ok(Archetype { types, row_size })
    }

    /// Build an archetype from a [`Bundle`]'s type set.
    pub fn create<B: Bundle>() -> Result<Self> {
        Self::from_types(B::type_infos())
    }

    /// The empty archetype (no component types).
    pub fn empty() -> Self {
        Archetype {
            types: SmallVec::new(),
            row_size: 0,
        }
    }

    /// Number of component types in this archetype.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// The sorted list of component types.
    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    /// Combined row size in bytes: the sum of every column's element size.
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    /// Index of a type by hash within this archetype's sorted type list.
    pub fn type_index_by_hash(&self, hash: u32) -> Option<usize> {
        self.types.iter().position(|t| t.hash() == hash)
    }

    /// Index of component type `T` within this archetype's sorted type list.
    pub fn type_index<T: Component>(&self) -> Option<usize> {
        self.type_index_by_hash(T::TYPE_HASH)
    }

    /// Whether this archetype carries component type `T`.
    pub fn has<T: Component>(&self) -> bool {
        self.type_index::<T>().is_some()
    }

    /// Whether this archetype carries the type identified by `hash`.
    pub fn has_hash(&self, hash: u32) -> bool {
        self.type_index_by_hash(hash).is_some()
    }

    /// Byte offset of column `index` within one chunk buffer holding
    /// `capacity` rows: the sum of every earlier column's total footprint.
    pub fn type_offset(&self, index: usize, capacity: usize) -> usize {
        self.types[..index].iter().map(|t| t.size() * capacity).sum()
    }

    /// Whether every type in `self` is also present in `other` — used to
    /// filter chunks against a query's required component set.
    pub fn is_subset_of(&self, other: &Archetype) -> bool {
        self.types.iter().all(|t| other.has_hash(t.hash()))
    }

    /// Two archetypes are equal when they carry exactly the same type hashes.
    pub fn same_types(&self, other: &Archetype) -> bool {
        self.types.len() == other.types.len()
            && self.types.iter().zip(other.types.iter()).all(|(a, b)| a.hash() == b.hash())
    }
}

impl PartialEq for Archetype {
    fn eq(&self, other: &Self) -> bool {
        self.same_types(other)
    }
}

impl Eq for Archetype {}

impl std::hash::Hash for Archetype {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for t in &self.types {
            t.hash().hash(state);
        }
    }
}
