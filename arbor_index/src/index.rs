// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::{Point, Rect};

use crate::backend::Backend;
use crate::backends::{FlatVec, UniformGrid};

/// Generational handle for entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "A frame never holds anywhere near 2^32 entries."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<P> {
    generation: u32,
    rect: Rect,
    payload: P,
}

/// An AABB index parameterized by a spatial backend.
///
/// Changes reach the backend immediately; there is no batching step.
#[derive(Debug)]
pub struct Index<P: Copy + Debug, B: Backend = FlatVec> {
    entries: Vec<Option<Entry<P>>>,
    // Generation of the last occupant of each slot, kept after removal.
    generations: Vec<u32>,
    free_list: Vec<usize>,
    len: usize,
    backend: B,
}

impl<P: Copy + Debug> Index<P> {
    /// An empty index on a flat vector backend.
    pub fn new() -> Self {
        Self::with_backend(FlatVec::default())
    }
}

impl<P: Copy + Debug> Default for Index<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy + Debug> Index<P, UniformGrid> {
    /// An empty index on a uniform grid of `cell`-sized squares.
    pub fn with_uniform_grid(cell: f64) -> Self {
        Self::with_backend(UniformGrid::new(cell))
    }
}

impl<P: Copy + Debug, B: Backend> Index<P, B> {
    /// An empty index on the given backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            backend,
        }
    }

    /// Reserve space for at least `n` entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
        self.generations.reserve(n);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a rectangle with payload. Returns a stable handle.
    pub fn insert(&mut self, rect: Rect, payload: P) -> Key {
        let idx = if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            self.entries.push(None);
            self.generations.push(0);
            self.entries.len() - 1
        };
        let generation = self.generations[idx].wrapping_add(1);
        self.generations[idx] = generation;
        self.entries[idx] = Some(Entry {
            generation,
            rect,
            payload,
        });
        self.backend.insert(idx, rect);
        self.len += 1;
        Key::new(idx, generation)
    }

    /// Move an existing entry. Stale keys are ignored.
    pub fn update(&mut self, key: Key, rect: Rect) {
        if let Some(e) = self.entry_mut(key) {
            e.rect = rect;
            self.backend.update(key.idx(), rect);
        }
    }

    /// Remove an entry, returning its payload. Stale keys are ignored.
    pub fn remove(&mut self, key: Key) -> Option<P> {
        let payload = self.entry_mut(key)?.payload;
        self.entries[key.idx()] = None;
        self.free_list.push(key.idx());
        self.backend.remove(key.idx());
        self.len -= 1;
        Some(payload)
    }

    /// The rectangle and payload behind `key`, if it is still live.
    pub fn get(&self, key: Key) -> Option<(Rect, P)> {
        let e = self.entries.get(key.idx())?.as_ref()?;
        (e.generation == key.1).then_some((e.rect, e.payload))
    }

    /// Remove every entry. Keys handed out before stay invalid.
    pub fn clear(&mut self) {
        for (idx, slot) in self.entries.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(idx);
            }
        }
        self.len = 0;
        self.backend.clear();
    }

    /// Entries whose rectangle contains the point.
    pub fn query_point(&self, pt: Point) -> impl Iterator<Item = (Key, P)> + '_ {
        self.resolve(self.backend.query_point(pt))
    }

    /// Entries whose rectangle intersects `rect`.
    pub fn query_rect(&self, rect: Rect) -> impl Iterator<Item = (Key, P)> + '_ {
        self.resolve(self.backend.query_rect(rect))
    }

    fn resolve<'a>(
        &'a self,
        slots: impl Iterator<Item = usize> + 'a,
    ) -> impl Iterator<Item = (Key, P)> + 'a {
        slots.filter_map(|i| {
            let e = self.entries.get(i)?.as_ref()?;
            Some((Key::new(i, e.generation), e.payload))
        })
    }

    fn entry_mut(&mut self, key: Key) -> Option<&mut Entry<P>> {
        let e = self.entries.get_mut(key.idx())?.as_mut()?;
        if e.generation != key.1 {
            return None;
        }
        Some(e)
    }
}
