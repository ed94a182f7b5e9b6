// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid backend over hashed cells.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;
use kurbo::{Point, Rect};

use crate::backend::{Backend, contains, overlaps};
use crate::cell::{CellGrid, CellKey};

/// Entries spanning more cells than this are kept in a side list and scanned.
const MAX_SPAN: u64 = 64;

#[derive(Clone, Copy, Debug)]
struct Slot {
    rect: Rect,
    large: bool,
}

/// Uniform grid backend.
///
/// Cells are stored sparsely, so coordinates can be negative and unbounded.
/// A rectangle much larger than a cell (a zoomed-in ancestor circle, say) is
/// not smeared across cells; it goes to a short list checked on every query.
#[derive(Clone)]
pub struct UniformGrid {
    grid: CellGrid,
    entries: Vec<Option<Slot>>,
    cells: HashMap<CellKey, Vec<usize>>,
    large: Vec<usize>,
}

impl UniformGrid {
    /// A grid of `cell`-sized squares anchored at the origin.
    pub fn new(cell: f64) -> Self {
        Self::with_grid(CellGrid::new(cell))
    }

    /// A grid with explicit cell geometry.
    pub fn with_grid(grid: CellGrid) -> Self {
        Self {
            grid,
            entries: Vec::new(),
            cells: HashMap::new(),
            large: Vec::new(),
        }
    }

    /// The cell geometry.
    pub fn grid(&self) -> CellGrid {
        self.grid
    }

    fn span(&self, rect: &Rect) -> u64 {
        let (x0, y0) = self.grid.cell_of(Point::new(rect.x0, rect.y0));
        let (x1, y1) = self.grid.cell_of(Point::new(rect.x1, rect.y1));
        let w = x1.saturating_sub(x0).saturating_add(1).unsigned_abs();
        let h = y1.saturating_sub(y0).saturating_add(1).unsigned_abs();
        w.saturating_mul(h)
    }

    fn place(&mut self, slot: usize, rect: Rect) {
        let large = self.span(&rect) > MAX_SPAN;
        if large {
            self.large.push(slot);
        } else {
            for key in self.grid.cells_for(rect) {
                self.cells.entry(key).or_default().push(slot);
            }
        }
        self.entries[slot] = Some(Slot { rect, large });
    }

    fn unplace(&mut self, slot: usize) {
        let Some(Some(old)) = self.entries.get(slot).copied() else {
            return;
        };
        if old.large {
            self.large.retain(|&s| s != slot);
            return;
        }
        for key in self.grid.cells_for(old.rect) {
            if let Some(slots) = self.cells.get_mut(&key) {
                if let Some(pos) = slots.iter().position(|&s| s == slot) {
                    slots.swap_remove(pos);
                }
                if slots.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }
}

impl Backend for UniformGrid {
    fn insert(&mut self, slot: usize, rect: Rect) {
        if self.entries.len() <= slot {
            self.entries.resize_with(slot + 1, || None);
        }
        self.unplace(slot);
        self.place(slot, rect);
    }

    fn update(&mut self, slot: usize, rect: Rect) {
        if matches!(self.entries.get(slot), Some(Some(_))) {
            self.unplace(slot);
            self.place(slot, rect);
        }
    }

    fn remove(&mut self, slot: usize) {
        self.unplace(slot);
        if let Some(e) = self.entries.get_mut(slot) {
            *e = None;
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.large.clear();
    }

    fn query_point<'a>(&'a self, pt: Point) -> Box<dyn Iterator<Item = usize> + 'a> {
        let key = self.grid.cell_of(pt);
        let candidates = self
            .cells
            .get(&key)
            .into_iter()
            .flatten()
            .chain(self.large.iter())
            .copied();
        Box::new(candidates.filter(move |&i| {
            matches!(self.entries.get(i), Some(Some(s)) if contains(&s.rect, pt))
        }))
    }

    fn query_rect<'a>(&'a self, rect: Rect) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out: Vec<usize> = if self.span(&rect) > self.cells.len() as u64 {
            // Cheaper to walk the occupied cells than the covered ones.
            self.cells.values().flatten().copied().collect()
        } else {
            self.grid
                .cells_for(rect)
                .filter_map(|key| self.cells.get(&key))
                .flatten()
                .copied()
                .collect()
        };
        out.extend_from_slice(&self.large);
        out.sort_unstable();
        out.dedup();
        out.retain(|&i| matches!(self.entries.get(i), Some(Some(s)) if overlaps(&s.rect, &rect)));
        Box::new(out.into_iter())
    }
}

impl Debug for UniformGrid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.entries.iter().filter(|e| e.is_some()).count();
        f.debug_struct("UniformGrid")
            .field("grid", &self.grid)
            .field("total_slots", &self.entries.len())
            .field("alive", &alive)
            .field("cells", &self.cells.len())
            .field("large", &self.large.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_are_indexed() {
        let mut g = UniformGrid::new(10.0);
        g.insert(0, Rect::new(-25.0, -25.0, -15.0, -15.0));
        assert_eq!(g.query_point(Point::new(-20.0, -20.0)).collect::<Vec<_>>(), [0]);
        assert_eq!(g.query_point(Point::new(20.0, 20.0)).count(), 0);
    }

    #[test]
    fn huge_rects_do_not_fill_cells() {
        let mut g = UniformGrid::new(10.0);
        g.insert(0, Rect::new(-1.0e9, -1.0e9, 1.0e9, 1.0e9));
        g.insert(1, Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(g.cells.len(), 1);
        assert_eq!(g.large, [0]);
        let mut hits: Vec<_> = g.query_point(Point::new(1.0, 1.0)).collect();
        hits.sort_unstable();
        assert_eq!(hits, [0, 1]);

        g.update(0, Rect::new(100.0, 100.0, 101.0, 101.0));
        assert!(g.large.is_empty());
        assert_eq!(g.query_point(Point::new(1.0, 1.0)).collect::<Vec<_>>(), [1]);
    }

    #[test]
    fn multi_cell_entries_reported_once() {
        let mut g = UniformGrid::new(4.0);
        g.insert(3, Rect::new(0.0, 0.0, 30.0, 30.0));
        assert_eq!(g.query_rect(Rect::new(-5.0, -5.0, 50.0, 50.0)).collect::<Vec<_>>(), [3]);
        g.remove(3);
        assert!(g.cells.is_empty());
        assert_eq!(g.query_rect(Rect::new(-5.0, -5.0, 50.0, 50.0)).count(), 0);
    }
}
