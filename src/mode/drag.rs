use crossterm::event::KeyModifiers;

use crate::grid::{CellId, Grid, Region};
use crate::selection::Selection;

/// One pointer-down to pointer-up gesture that started as a plain click
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragSession {
    pub start: CellId,
    pub region: Region,
    pub moved: bool,
    pub current: CellId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Armed(DragSession),
}

/// Whether a gesture is a click or a rectangle is only decided on
/// pointer-up, so a plain press never touches the selection.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Armed(_))
    }

    /// Shift extends from the anchor, Ctrl/Super toggles; both finish the
    /// gesture at once. A plain press arms a drag session.
    pub fn pointer_down(
        &mut self,
        grid: &Grid,
        selection: &mut Selection,
        cell: CellId,
        modifiers: KeyModifiers,
    ) {
        self.state = DragState::Idle;
        let Some(region) = grid.cell(cell).filter(|c| c.is_selectable()).map(|c| c.region) else {
            return;
        };

        if modifiers.contains(KeyModifiers::SHIFT) {
            match selection.anchor() {
                Some(anchor) => selection.range(grid, anchor, cell),
                None => selection.select(grid, cell, false),
            }
        } else if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER) {
            selection.toggle(grid, cell);
        } else {
            self.state = DragState::Armed(DragSession { start: cell, region, moved: false, current: cell });
        }
    }

    /// Returns true if the selection changed
    pub fn pointer_move(&mut self, grid: &Grid, selection: &mut Selection, cell: CellId) -> bool {
        let DragState::Armed(session) = &mut self.state else {
            return false;
        };
        if grid.region_of(cell) != Some(session.region) || (cell == session.current && session.moved) {
            return false;
        }
        if cell == session.start && !session.moved {
            return false;
        }

        session.moved = true;
        session.current = cell;
        selection.select_rect(grid, session.start, cell, session.region);
        true
    }

    pub fn pointer_up(&mut self, grid: &Grid, selection: &mut Selection) {
        if let DragState::Armed(session) = std::mem::take(&mut self.state) {
            if !session.moved {
                selection.clear_all();
                selection.select(grid, session.start, false);
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}
