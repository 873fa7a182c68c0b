use crate::grid::{CellId, Grid, Region};

/// Selected cells in insertion order, plus the anchor used as origin for
/// range selection, navigation and sequential paste.
///
/// All selected cells are pairwise region-compatible. Every operation is a
/// no-op on cells that do not exist or cannot be selected.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    cells: Vec<CellId>,
    anchor: Option<CellId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn anchor(&self) -> Option<CellId> {
        self.anchor
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains(&id)
    }

    /// Select `id` and make it the anchor. Non-additive selects replace the
    /// selection; additive selects of an incompatible cell are ignored.
    pub fn select(&mut self, grid: &Grid, id: CellId, additive: bool) {
        let Some(region) = selectable_region(grid, id) else {
            return;
        };
        if !additive {
            self.cells.clear();
        } else if !self.accepts(grid, region) {
            return;
        }
        if !self.cells.contains(&id) {
            self.cells.push(id);
        }
        self.anchor = Some(id);
    }

    pub fn deselect(&mut self, id: CellId) {
        self.cells.retain(|&c| c != id);
        if self.anchor == Some(id) {
            self.anchor = None;
        }
    }

    pub fn toggle(&mut self, grid: &Grid, id: CellId) {
        if self.contains(id) {
            self.deselect(id);
        } else {
            self.select(grid, id, true);
        }
    }

    /// Select the document-order span of selectable cells between `anchor` and
    /// `end`, keeping only cells compatible with the anchor's region.
    /// Incompatible endpoints leave the selection untouched.
    pub fn range(&mut self, grid: &Grid, anchor: CellId, end: CellId) {
        let (Some(from), Some(to)) = (selectable_region(grid, anchor), selectable_region(grid, end)) else {
            return;
        };
        if !from.compatible(to) {
            return;
        }

        let order = grid.selectable_cells();
        let (Some(a), Some(b)) = (
            order.iter().position(|&c| c == anchor),
            order.iter().position(|&c| c == end),
        ) else {
            return;
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        self.cells = order[lo..=hi]
            .iter()
            .copied()
            .filter(|&c| grid.region_of(c).map_or(false, |r| r.compatible(from)))
            .collect();
        self.anchor = Some(anchor);
    }

    /// Replace the selection with every selectable cell of `region` inside
    /// the row/column rectangle spanned by `start` and `end`.
    pub fn select_rect(&mut self, grid: &Grid, start: CellId, end: CellId, region: Region) {
        let (r0, r1) = (start.row.min(end.row), start.row.max(end.row));
        let (c0, c1) = (start.col.min(end.col), start.col.max(end.col));

        self.cells = (r0..=r1)
            .flat_map(|r| (c0..=c1).map(move |c| CellId::new(r, c)))
            .filter(|&id| grid.is_selectable(id) && grid.region_of(id) == Some(region))
            .collect();
        self.anchor = self.contains(start).then_some(start);
    }

    pub fn clear_all(&mut self) {
        self.cells.clear();
        self.anchor = None;
    }

    fn accepts(&self, grid: &Grid, region: Region) -> bool {
        self.cells
            .iter()
            .all(|&c| grid.region_of(c).map_or(true, |r| r.compatible(region)))
    }
}

fn selectable_region(grid: &Grid, id: CellId) -> Option<Region> {
    grid.cell(id).filter(|c| c.is_selectable()).map(|c| c.region)
}
