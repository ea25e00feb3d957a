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

//! Query dispatch: matching chunks against a required component set and
//! walking their rows.
//!
//! A query never copies data out of a chunk. It resolves which chunks carry
//! every required type, fetches one column pointer per required type, and
//! calls the user closure once per live row in ascending row order. Chunks
//! are visited in ascending chunk-id order because `World` keeps them in a
//! `BTreeMap`.

use std::collections::BTreeMap;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::Archetype;
use crate::chunk::Chunk;
use crate::component::Bundle;
use crate::entity::ChunkId;
use crate::error::Result;
use crate::type_info::Component;

/// Visit every chunk whose archetype is a superset of `(T1,)`, calling `f`
/// once per live row in ascending (chunk-id, row) order.
pub(crate) fn for_each1<T1, F>(chunks: &mut BTreeMap<ChunkId, Chunk>, f: &mut F) -> Result<()>
where
    T1: Component,
    F: FnMut(&mut T1),
{
    let target = Archetype::create::<(T1,)>()?;
    #[cfg(feature = "profiling")]
    let _span = info_span!("world.for_each1").entered();
    for chunk in chunks.values_mut() {
        if !target.is_subset_of(chunk.archetype()) {
            continue;
        }
        let p1 = match chunk.get_column_mut::<T1>() {
            Some(p) => p,
            None => continue,
        };
        for row in 0..chunk.len() {
            unsafe { f(&mut *p1.add(row)) };
        }
    }
    Ok(())
}

/// Visit every chunk whose archetype is a superset of `(T1, T2)`.
pub(crate) fn for_each2<T1, T2, F>(chunks: &mut BTreeMap<ChunkId, Chunk>, f: &mut F) -> Result<()>
where
    T1: Component,
    T2: Component,
    F: FnMut(&mut T1, &mut T2),
{
    let target = Archetype::create::<(T1, T2)>()?;
    #[cfg(feature = "profiling")]
    let _span = info_span!("world.for_each2").entered();
    for chunk in chunks.values_mut() {
        if !target.is_subset_of(chunk.archetype()) {
            continue;
        }
        let (p1, p2) = match (chunk.get_column_mut::<T1>(), chunk.get_column_mut::<T2>()) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        for row in 0..chunk.len() {
            unsafe { f(&mut *p1.add(row), &mut *p2.add(row)) };
        }
    }
    Ok(())
}

/// Visit every chunk whose archetype is a superset of `(T1, T2, T3)`.
pub(crate) fn for_each3<T1, T2, T3, F>(
    chunks: &mut BTreeMap<ChunkId, Chunk>,
    f: &mut F,
) -> Result<()>
where
    T1: Component,
    T2: Component,
    T3: Component,
    F: FnMut(&mut T1, &mut T2, &mut T3),
{
    let target = Archetype::create::<(T1, T2, T3)>()?;
    #[cfg(feature = "profiling")]
    let _span = info_span!("world.for_each3").entered();
    for chunk in chunks.values_mut() {
        if !target.is_subset_of(chunk.archetype()) {
            continue;
        }
        let (p1, p2, p3) = match (
            chunk.get_column_mut::<T1>(),
            chunk.get_column_mut::<T2>(),
            chunk.get_column_mut::<T3>(),
        ) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => continue,
        };
        for row in 0..chunk.len() {
            unsafe { f(&mut *p1.add(row), &mut *p2.add(row), &mut *p3.add(row)) };
        }
    }
    Ok(())
}

/// Visit every chunk whose archetype is a superset of `(T1, T2, T3, T4)`.
pub(crate) fn for_each4<T1, T2, T3, T4, F>(
    chunks: &mut BTreeMap<ChunkId, Chunk>,
    f: &mut F,
) -> Result<()>
where
    T1: Component,
    T2: Component,
    T3: Component,
    T4: Component,
    F: FnMut(&mut T1, &mut T2, &mut T3, &mut T4),
{
    let target = Archetype::create::<(T1, T2, T3, T4)>()?;
    #[cfg(feature = "profiling")]
    let _span = info_span!("world.for_each4").entered();
    for chunk in chunks.values_mut() {
        if !target.is_subset_of(chunk.archetype()) {
            continue;
        }
        let (p1, p2, p3, p4) = match (
            chunk.get_column_mut::<T1>(),
            chunk.get_column_mut::<T2>(),
            chunk.get_column_mut::<T3>(),
            chunk.get_column_mut::<T4>(),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => continue,
        };
        for row in 0..chunk.len() {
            unsafe {
                f(
                    &mut *p1.add(row),
                    &mut *p2.add(row),
                    &mut *p3.add(row),
                    &mut *p4.add(row),
                )
            };
        }
    }
    Ok(())
}

/// A raw pointer wrapper that asserts it is safe to move across worker
/// threads. Sound here because every worker is handed a disjoint row range
/// of the same column by construction: no two workers ever touch the same
/// byte.
#[derive(Clone, Copy)]
struct SendPtr<T>(*mut T);

unsafe impl<T> Send for SendPtr<T> {}

/// Partition `len` items across `workers` contiguous, roughly equal slices
/// using the `start = i * len / workers` rule from the spec.
fn partition(len: usize, workers: usize) -> Vec<(usize, usize)> {
    let workers = workers.max(1);
    (0..workers)
        .map(|i| (i * len / workers, (i + 1) * len / workers))
        .collect()
}

/// Run `f` over every live row of every chunk matching `(T,)`, partitioned
/// into `n` contiguous row ranges executed concurrently. Returns once every
/// worker has completed.
#[cfg(feature = "parallel")]
pub(crate) fn for_each_parallel<T, F>(
    chunks: &mut BTreeMap<ChunkId, Chunk>,
    n: usize,
    f: &F,
) -> Result<()>
where
    T: Component,
    F: Fn(&mut T) + Sync,
{
    let target = Archetype::create::<(T,)>()?;
    #[cfg(feature = "profiling")]
    let _span = info_span!("world.for_each_parallel", workers = n).entered();
    for chunk in chunks.values_mut() {
        if !target.is_subset_of(chunk.archetype()) {
            continue;
        }
        let len = chunk.len();
        if len == 0 {
            continue;
        }
        let ptr = match chunk.get_column_mut::<T>() {
            Some(p) => p,
            None => continue,
        };
        let send_ptr = SendPtr(ptr);
        let ranges = partition(len, n);
        rayon::scope(|scope| {
            for (start, end) in ranges {
                let send_ptr = send_ptr;
                scope.spawn(move |_| {
                    let base = send_ptr.0;
                    for row in start..end {
                        unsafe { f(&mut *base.add(row)) };
                    }
                });
            }
        });
    }
    Ok(())
}

/// Sequential fallback used when the `parallel` feature is disabled: same
/// partitioning, run on the calling thread.
#[cfg(not(feature = "parallel"))]
pub(crate) fn for_each_parallel<T, F>(
    chunks: &mut BTreeMap<ChunkId, Chunk>,
    n: usize,
    f: &F,
) -> Result<()>
where
    T: Component,
    F: Fn(&mut T) + Sync,
{
    let target = Archetype::create::<(T,)>()?;
    for chunk in chunks.values_mut() {
        if !target.is_subset_of(chunk.archetype()) {
            continue;
        }
        let len = chunk.len();
        if len == 0 {
            continue;
        }
        let ptr = match chunk.get_column_mut::<T>() {
            Some(p) => p,
            None => continue,
        };
        for (start, end) in partition(len, n) {
            for row in start..end {
                unsafe { f(&mut *ptr.add(row)) };
            }
        }
    }
    Ok(())
}

/// Count chunks whose archetype is a superset of `B`'s type set. Exposed for
/// diagnostics and tests.
#[cfg(test)]
pub(crate) fn matching_chunk_count<B: Bundle>(chunks: &BTreeMap<ChunkId, Chunk>) -> Result<usize> {
    let target = Archetype::create::<B>()?;
    Ok(chunks
        .values()
        .filter(|c| target.is_subset_of(c.archetype()))
        .count())
}
