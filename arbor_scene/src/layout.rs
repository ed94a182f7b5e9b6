// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nested circle layout.
//!
//! A node's children sit on a square grid inscribed in the node's circle.
//! The largest sibling (by leaf count) fills its grid cell; the others shrink
//! by `sqrt(leaf_count / max_leaf_count)`, so area tracks leaf count.
//! Placement depends only on the parent circle and the siblings' leaf counts.

use kurbo::{Circle, Point};

/// Layout parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Radius of the root circle, in world units.
    pub root_radius: f64,
    /// Fraction of the inscribed square the child grid may use.
    pub grid_fill: f64,
    /// Fraction of a grid cell the largest child's diameter may use.
    pub child_fill: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_radius: 1_000.0,
            grid_fill: 0.94,
            child_fill: 0.9,
        }
    }
}

impl LayoutConfig {
    /// The root's circle.
    pub fn root_circle(&self) -> Circle {
        Circle::new(Point::ORIGIN, self.root_radius)
    }

    /// Circles for children with the given leaf counts, in order.
    ///
    /// Every returned circle lies strictly inside `parent` as long as the fill
    /// factors are below one.
    pub fn children(&self, parent: Circle, leaf_counts: &[u64]) -> Vec<Circle> {
        let n = leaf_counts.len();
        if n == 0 {
            return Vec::new();
        }
        let (cols, rows) = grid_shape(n);
        let side = parent.radius * core::f64::consts::SQRT_2 * self.grid_fill.clamp(0.0, 0.999);
        let cell = side / cols.max(rows) as f64;
        let max_r = cell / 2.0 * self.child_fill.clamp(0.0, 0.999);
        let origin = Point::new(
            parent.center.x - cell * cols as f64 / 2.0,
            parent.center.y - cell * rows as f64 / 2.0,
        );
        let max_leaves = leaf_counts.iter().copied().max().unwrap_or(1).max(1) as f64;
        leaf_counts
            .iter()
            .enumerate()
            .map(|(i, &leaves)| {
                let (col, row) = (i % cols, i / cols);
                let center = Point::new(
                    origin.x + (col as f64 + 0.5) * cell,
                    origin.y + (row as f64 + 0.5) * cell,
                );
                let scale = (leaves.max(1) as f64 / max_leaves).sqrt();
                Circle::new(center, max_r * scale)
            })
            .collect()
    }
}

/// Columns and rows of the smallest near-square grid holding `n` cells.
fn grid_shape(n: usize) -> (usize, usize) {
    let mut cols = 1;
    while cols * cols < n {
        cols += 1;
    }
    (cols, n.div_ceil(cols))
}
