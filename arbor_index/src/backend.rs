// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use alloc::boxed::Box;

use kurbo::{Point, Rect};

/// Spatial backend abstraction used by [`Index`](crate::Index).
///
/// Backends only see slot numbers; payloads and generations live in the index.
pub trait Backend {
    /// Insert a new slot into the spatial structure.
    fn insert(&mut self, slot: usize, rect: Rect);

    /// Update an existing slot's rectangle.
    fn update(&mut self, slot: usize, rect: Rect);

    /// Remove a slot from the spatial structure.
    fn remove(&mut self, slot: usize);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Query slots whose rectangle contains the point.
    fn query_point<'a>(&'a self, pt: Point) -> Box<dyn Iterator<Item = usize> + 'a>;

    /// Query slots whose rectangle intersects `rect`.
    fn query_rect<'a>(&'a self, rect: Rect) -> Box<dyn Iterator<Item = usize> + 'a>;
}

/// Whether `rect` contains `pt`, edges included.
#[inline]
pub fn contains(rect: &Rect, pt: Point) -> bool {
    rect.x0 <= pt.x && pt.x <= rect.x1 && rect.y0 <= pt.y && pt.y <= rect.y1
}

/// Whether two rectangles share at least one point, edges included.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
