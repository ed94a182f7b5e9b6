// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Index: a screen-space AABB index.
//!
//! Each frame, the scene projects its visible circles to screen space and
//! feeds their bounding boxes here; picking and neighbourhood queries then run
//! against the index instead of walking the tree again.
//!
//! - Insert, update, and remove [`kurbo::Rect`]s carrying a small payload.
//! - Query by point or by intersecting rectangle. Both tests are closed: a
//!   point on an edge is inside, and rectangles that only touch do intersect.
//! - Handles are generational [`Key`]s; a key whose slot has been reused is
//!   rejected rather than aliasing the new occupant.
//!
//! Backends are pluggable through [`Backend`]. [`FlatVec`] scans linearly and
//! suits a few hundred entries. [`UniformGrid`] buckets entries into square
//! cells of a [`CellGrid`] and is the better choice for dense frames. The same
//! [`CellGrid`] geometry is used for label placement, which only needs to know
//! which cells are taken.
//!
//! Rectangles are expected to be finite and normalized (`x0 <= x1`, `y0 <= y1`).
//!
//! ```rust
//! use arbor_index::{Index, UniformGrid};
//! use kurbo::{Point, Rect};
//!
//! let mut idx: Index<u32> = Index::new();
//! let a = idx.insert(Rect::new(0.0, 0.0, 10.0, 10.0), 1);
//! idx.insert(Rect::new(5.0, 5.0, 15.0, 15.0), 2);
//!
//! let hits: Vec<_> = idx.query_point(Point::new(2.0, 2.0)).map(|(_, p)| p).collect();
//! assert_eq!(hits, [1]);
//!
//! idx.update(a, Rect::new(-20.0, -20.0, -10.0, -10.0));
//! assert_eq!(idx.query_rect(Rect::new(0.0, 0.0, 6.0, 6.0)).count(), 1);
//!
//! // Same API on a 64px grid.
//! let mut grid = Index::<u32, UniformGrid>::with_backend(UniformGrid::new(64.0));
//! grid.insert(Rect::new(-100.0, 30.0, 100.0, 40.0), 7);
//! assert_eq!(grid.query_point(Point::new(-99.0, 35.0)).count(), 1);
//! ```

#![no_std]

extern crate alloc;

mod backend;
mod backends;
mod cell;
mod index;

pub use backend::{Backend, contains, overlaps};
pub use backends::{FlatVec, UniformGrid};
pub use cell::{CellGrid, CellKey};
pub use index::{Index, Key};
