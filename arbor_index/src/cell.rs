// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Square cell geometry shared by the grid backend and label placement.

use kurbo::{Point, Rect};

/// Integer coordinates of a grid cell.
pub type CellKey = (i64, i64);

/// A grid of square cells anchored at an origin. Coordinates may be negative.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CellGrid {
    cell: f64,
    origin: Point,
}

impl CellGrid {
    /// A grid of `cell`-sized squares anchored at the origin.
    ///
    /// Non-positive or non-finite sizes fall back to one unit.
    pub fn new(cell: f64) -> Self {
        Self::with_origin(cell, Point::ORIGIN)
    }

    /// A grid anchored at `origin`.
    pub fn with_origin(cell: f64, origin: Point) -> Self {
        let cell = if cell.is_finite() && cell > 0.0 {
            cell
        } else {
            1.0
        };
        Self { cell, origin }
    }

    /// Edge length of one cell.
    pub fn cell_size(&self) -> f64 {
        self.cell
    }

    #[inline]
    fn floor_to_i64(v: f64) -> i64 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Cell coordinates saturate for absurd inputs; screen space never gets there."
        )]
        let i = v as i64;
        if (i as f64) > v { i - 1 } else { i }
    }

    /// The cell containing `pt`.
    pub fn cell_of(&self, pt: Point) -> CellKey {
        (
            Self::floor_to_i64((pt.x - self.origin.x) / self.cell),
            Self::floor_to_i64((pt.y - self.origin.y) / self.cell),
        )
    }

    /// Every cell `rect` touches, row by row.
    pub fn cells_for(&self, rect: Rect) -> impl Iterator<Item = CellKey> + use<> {
        let (min_x, min_y) = self.cell_of(Point::new(rect.x0, rect.y0));
        let (max_x, max_y) = self.cell_of(Point::new(rect.x1, rect.y1));
        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| (x, y)))
    }

    /// `key` and its eight neighbours.
    pub fn neighbourhood(key: CellKey) -> [CellKey; 9] {
        let (x, y) = key;
        [
            (x - 1, y - 1),
            (x, y - 1),
            (x + 1, y - 1),
            (x - 1, y),
            (x, y),
            (x + 1, y),
            (x - 1, y + 1),
            (x, y + 1),
            (x + 1, y + 1),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn floors_negative_coordinates() {
        let grid = CellGrid::new(10.0);
        assert_eq!(grid.cell_of(Point::new(0.0, 9.99)), (0, 0));
        assert_eq!(grid.cell_of(Point::new(-0.5, -10.0)), (-1, -1));
        assert_eq!(grid.cell_of(Point::new(-10.5, 25.0)), (-2, 2));
    }

    #[test]
    fn covers_rect_cells() {
        let grid = CellGrid::with_origin(10.0, Point::new(5.0, 5.0));
        let cells: Vec<_> = grid.cells_for(Rect::new(5.0, 5.0, 25.0, 14.0)).collect();
        assert_eq!(cells, [(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn degenerate_size_falls_back() {
        assert_eq!(CellGrid::new(0.0).cell_size(), 1.0);
        assert_eq!(CellGrid::new(f64::NAN).cell_size(), 1.0);
    }
}
