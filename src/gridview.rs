use ratatui::layout::Rect;
use unicode_width::UnicodeWidthStr;

use crate::grid::{CellId, Grid, Section};

const MIN_COL_WIDTH: usize = 3;
const MAX_COL_WIDTH: usize = 16;

/// View state for the grid (viewport, cached widths, cell hit boxes)
#[derive(Debug, Default)]
pub struct GridView {
    /// First body row shown, counted from the first non-header row
    pub viewport_row: usize,
    /// First scrollable column shown (absolute column index)
    pub viewport_col: usize,
    pub visible_rows: usize,
    pub visible_cols: usize,
    pub col_widths: Vec<usize>,
    /// Screen rectangle of every drawn cell, filled by the renderer
    hits: Vec<(Rect, CellId)>,
    /// Cell the viewport was last scrolled to
    followed: Option<CellId>,
}

impl GridView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget scroll position and hit boxes, e.g. after switching months
    pub fn reset(&mut self, grid: &Grid) {
        *self = Self::new();
        self.viewport_col = grid.frozen_cols;
        self.update_col_widths(grid);
    }

    /// Column widths from header names and single-column cell texts
    pub fn update_col_widths(&mut self, grid: &Grid) {
        self.col_widths = (0..grid.col_count())
            .map(|col| {
                let header = grid.columns.get(col).map_or(0, |c| c.width());
                grid.rows()
                    .iter()
                    .filter_map(|row| row.cells.get(col))
                    .filter(|cell| cell.span == 1)
                    .map(|cell| cell.text.width())
                    .fold(header, usize::max)
                    .clamp(MIN_COL_WIDTH, MAX_COL_WIDTH)
            })
            .collect();
    }

    pub fn width_of(&self, col: usize) -> usize {
        self.col_widths.get(col).copied().unwrap_or(MIN_COL_WIDTH)
    }

    /// Leading rows that stay on screen while scrolling
    pub fn pinned_rows(grid: &Grid) -> usize {
        grid.rows().iter().take_while(|r| r.section == Section::Head).count()
    }

    /// Ensure viewport contains the cell, once per new target
    pub fn follow(&mut self, grid: &Grid, target: Option<CellId>) {
        if target == self.followed {
            return;
        }
        self.followed = target;
        if let Some(cell) = target {
            self.scroll_to(grid, cell);
        }
    }

    pub fn scroll_to(&mut self, grid: &Grid, cell: CellId) {
        let pinned = Self::pinned_rows(grid);
        if cell.row >= pinned && self.visible_rows > 0 {
            let body_row = cell.row - pinned;
            if body_row < self.viewport_row {
                self.viewport_row = body_row;
            } else if body_row >= self.viewport_row + self.visible_rows {
                self.viewport_row = body_row + 1 - self.visible_rows;
            }
        }

        if cell.col >= grid.frozen_cols && self.visible_cols > 0 {
            if cell.col < self.viewport_col {
                self.viewport_col = cell.col;
            } else if cell.col >= self.viewport_col + self.visible_cols {
                self.viewport_col = cell.col + 1 - self.visible_cols;
            }
        }
    }

    /// Mouse-wheel scrolling, clamped to the body
    pub fn scroll_rows(&mut self, grid: &Grid, delta: isize) {
        let body = grid.row_count().saturating_sub(Self::pinned_rows(grid));
        let max = body.saturating_sub(self.visible_rows.max(1));
        self.viewport_row = self.viewport_row.saturating_add_signed(delta).min(max);
    }

    /// Columns drawn for a grid area `width` cells wide, with their x offsets.
    /// Frozen columns come first, then scrollable ones from the viewport on.
    pub fn layout_columns(&self, grid: &Grid, width: u16) -> Vec<(usize, u16)> {
        let frozen = grid.frozen_cols.min(grid.col_count());
        let first = self.viewport_col.max(frozen);
        let mut out = Vec::new();
        let mut x = 0usize;
        for col in (0..frozen).chain(first..grid.col_count()) {
            let w = self.width_of(col);
            if x + w > width as usize && col >= frozen {
                break;
            }
            out.push((col, x as u16));
            x += w + 1;
        }
        out
    }

    pub fn set_hits(&mut self, hits: Vec<(Rect, CellId)>) {
        self.hits = hits;
    }

    /// Cell drawn at a screen position
    pub fn hit(&self, x: u16, y: u16) -> Option<CellId> {
        self.hits
            .iter()
            .find(|(rect, _)| {
                x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
            })
            .map(|&(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::FunnelConfig;
    use crate::grid::layout::month_grid;

    fn grid() -> Grid {
        let funnel = FunnelConfig::from_modules("test", "Test", &["paid-ads".to_string()]);
        month_grid(&funnel, 2025, 3)
    }

    fn view(grid: &Grid, rows: usize, cols: usize) -> GridView {
        let mut view = GridView::new();
        view.reset(grid);
        view.visible_rows = rows;
        view.visible_cols = cols;
        view
    }

    #[test]
    fn test_col_widths_are_clamped() {
        let grid = grid();
        let view = view(&grid, 10, 3);
        assert_eq!(view.col_widths.len(), grid.col_count());
        // "Tag" header, weekday letters
        assert_eq!(view.width_of(0), 3);
        // "dd.mm.yy"
        assert_eq!(view.width_of(1), 8);
        assert!(view.col_widths.iter().all(|&w| (MIN_COL_WIDTH..=MAX_COL_WIDTH).contains(&w)));
    }

    #[test]
    fn test_scroll_to_rows() {
        let grid = grid();
        let mut view = view(&grid, 10, 3);
        assert_eq!(GridView::pinned_rows(&grid), 1);

        view.scroll_to(&grid, CellId::new(15, 2));
        assert_eq!(view.viewport_row, 5);

        view.scroll_to(&grid, CellId::new(3, 2));
        assert_eq!(view.viewport_row, 2);

        // header row never scrolls
        view.scroll_to(&grid, CellId::new(0, 2));
        assert_eq!(view.viewport_row, 2);
    }

    #[test]
    fn test_scroll_to_columns_skips_frozen() {
        let grid = grid();
        let mut view = view(&grid, 10, 2);
        assert_eq!(view.viewport_col, 2);

        view.scroll_to(&grid, CellId::new(5, 6));
        assert_eq!(view.viewport_col, 5);

        view.scroll_to(&grid, CellId::new(5, 1));
        assert_eq!(view.viewport_col, 5);

        view.scroll_to(&grid, CellId::new(5, 3));
        assert_eq!(view.viewport_col, 3);
    }

    #[test]
    fn test_follow_only_on_new_target() {
        let grid = grid();
        let mut view = view(&grid, 10, 3);
        view.follow(&grid, Some(CellId::new(20, 2)));
        assert_eq!(view.viewport_row, 10);

        view.scroll_rows(&grid, -4);
        view.follow(&grid, Some(CellId::new(20, 2)));
        assert_eq!(view.viewport_row, 6);
    }

    #[test]
    fn test_scroll_rows_clamped() {
        let grid = grid();
        let mut view = view(&grid, 10, 3);
        view.scroll_rows(&grid, -3);
        assert_eq!(view.viewport_row, 0);
        view.scroll_rows(&grid, 1000);
        assert_eq!(view.viewport_row, grid.row_count() - 1 - 10);
    }

    #[test]
    fn test_layout_columns_keeps_frozen() {
        let grid = grid();
        let mut view = view(&grid, 10, 3);
        view.viewport_col = 4;
        let cols = view.layout_columns(&grid, 30);
        assert_eq!(cols[0], (0, 0));
        assert_eq!(cols[1], (1, 4));
        assert_eq!(cols[2].0, 4);
        assert!(cols.iter().all(|&(c, _)| c < 2 || c >= 4));
    }

    #[test]
    fn test_hit() {
        let mut view = GridView::new();
        view.set_hits(vec![
            (Rect::new(0, 2, 4, 1), CellId::new(1, 0)),
            (Rect::new(5, 2, 8, 1), CellId::new(1, 1)),
        ]);
        assert_eq!(view.hit(3, 2), Some(CellId::new(1, 0)));
        assert_eq!(view.hit(5, 2), Some(CellId::new(1, 1)));
        assert_eq!(view.hit(4, 2), None);
        assert_eq!(view.hit(5, 3), None);
    }
}
