use std::time::{Duration, Instant};

use crossterm::event::KeyModifiers;
use tracing::{debug, warn};

use crate::clipboard::Clipboard;
use crate::format::{edit_text, parse_number};
use crate::grid::{CellId, Grid};
use crate::mode::drag::DragController;
use crate::mode::edit::EditController;
use crate::mode::Mode;
use crate::selection::Selection;
use crate::tracker::GridHost;

/// Two presses on the same cell within this window open the editor
pub const DOUBLE_CLICK: Duration = Duration::from_millis(400);

/// Interaction state of one grid: selection, edit session, drag gesture and
/// clipboard. Owned by the shell and passed by reference to every handler.
#[derive(Default)]
pub struct Interaction {
    pub selection: Selection,
    pub edit: EditController,
    pub drag: DragController,
    pub clipboard: Clipboard,
    last_click: Option<(CellId, Instant)>,
}

impl Interaction {
    pub fn new(clear_after_paste: bool) -> Self {
        let mut interaction = Self::default();
        interaction.clipboard.clear_after_paste = clear_after_paste;
        interaction
    }

    pub fn mode(&self) -> Mode {
        self.edit.mode()
    }

    pub fn select(&mut self, grid: &Grid, cell: CellId) {
        self.selection.select(grid, cell, false);
    }

    /// Open the editor on an input cell, showing its raw stored value
    pub fn enter_edit(&mut self, grid: &Grid, host: &impl GridHost, cell: CellId) -> bool {
        let Some((key, original)) = input_of(grid, cell) else {
            return false;
        };
        let buffer = host.read(&key).map(edit_text).unwrap_or_default();
        if !self.edit.enter(cell, buffer, original) {
            return false;
        }
        self.selection.clear_all();
        debug!(%key, "enter edit");
        true
    }

    /// Open the editor replacing the cell's content with one typed character
    pub fn enter_edit_with(&mut self, grid: &Grid, cell: CellId, ch: char) -> bool {
        let Some((key, original)) = input_of(grid, cell) else {
            return false;
        };
        if !self.edit.enter_with(cell, ch, original) {
            return false;
        }
        self.selection.clear_all();
        debug!(%key, "enter edit by typing");
        true
    }

    /// Close the editor and store its buffer. Empty input removes the field,
    /// malformed input clears it. The edited cell becomes the selection.
    pub fn commit_edit(&mut self, grid: &mut Grid, host: &mut impl GridHost) -> Option<CellId> {
        let session = self.edit.exit()?;
        let key = grid.key_of(session.cell)?.to_string();

        let input = session.buffer.trim();
        let value = if input.is_empty() {
            None
        } else {
            let parsed = parse_number(input);
            if parsed.is_none() {
                warn!(%key, input, "malformed number cleared");
            }
            parsed
        };

        host.write(&key, value);
        let text = value.map(|v| host.format(v, &key)).unwrap_or_default();
        if let Some(cell) = grid.cell_mut(session.cell) {
            cell.text = text;
        }
        host.recalculate(grid);

        self.selection.select(grid, session.cell, false);
        Some(session.cell)
    }

    /// Close the editor without storing; the cell text is resynced from the store
    pub fn cancel_edit(&mut self, grid: &mut Grid, host: &impl GridHost) -> Option<CellId> {
        let session = self.edit.exit()?;
        if let Some(key) = grid.key_of(session.cell).map(str::to_string) {
            let text = host.read(&key).map(|v| host.format(v, &key)).unwrap_or_default();
            if let Some(cell) = grid.cell_mut(session.cell) {
                cell.text = text;
            }
        }
        self.selection.select(grid, session.cell, false);
        Some(session.cell)
    }

    pub fn copy(&mut self, grid: &Grid, host: &impl GridHost) -> usize {
        self.clipboard.capture(grid, &self.selection, host)
    }

    pub fn paste(&mut self, grid: &mut Grid, host: &mut impl GridHost) -> usize {
        self.clipboard.replay(grid, &self.selection, host)
    }

    /// Remove the stored value of every selected input cell. Returns how many
    /// cells actually held a value.
    pub fn clear_selected(&mut self, grid: &mut Grid, host: &mut impl GridHost) -> usize {
        let mut updates = Vec::new();
        for &id in self.selection.cells() {
            let Some(key) = grid
                .cell(id)
                .filter(|c| c.is_input())
                .and_then(|c| c.key())
                .map(str::to_string)
            else {
                continue;
            };
            if host.read(&key).is_none() {
                continue;
            }
            if let Some(cell) = grid.cell_mut(id) {
                cell.text.clear();
            }
            updates.push((key, None));
        }
        if !updates.is_empty() {
            host.write_many(&updates);
            host.recalculate(grid);
        }
        updates.len()
    }

    /// Escape outside of an edit
    pub fn escape(&mut self) {
        self.selection.clear_all();
        self.clipboard.clear_highlight();
    }

    /// Pointer pressed on `cell` (`None` outside the grid)
    pub fn pointer_down(
        &mut self,
        grid: &mut Grid,
        host: &mut impl GridHost,
        cell: Option<CellId>,
        modifiers: KeyModifiers,
        now: Instant,
    ) {
        if let Some(editing) = self.edit.editing_cell() {
            if cell == Some(editing) {
                return;
            }
            self.commit_edit(grid, host);
        }

        let Some(cell) = cell.filter(|&c| grid.is_selectable(c)) else {
            self.drag.cancel();
            self.selection.clear_all();
            self.last_click = None;
            return;
        };

        let double = modifiers.is_empty()
            && self
                .last_click
                .map_or(false, |(prev, at)| prev == cell && now.duration_since(at) <= DOUBLE_CLICK);
        if double && grid.is_input(cell) {
            self.drag.cancel();
            self.last_click = None;
            self.enter_edit(grid, host, cell);
            return;
        }

        self.last_click = Some((cell, now));
        self.drag.pointer_down(grid, &mut self.selection, cell, modifiers);
    }

    pub fn pointer_move(&mut self, grid: &Grid, cell: Option<CellId>) -> bool {
        match cell {
            Some(cell) => self.drag.pointer_move(grid, &mut self.selection, cell),
            None => false,
        }
    }

    pub fn pointer_up(&mut self, grid: &Grid) {
        self.drag.pointer_up(grid, &mut self.selection);
    }

    /// Second phase of every frame, run after drawing
    pub fn settle(&mut self) -> bool {
        self.edit.settle()
    }

    /// Write selection, edit and copy flags onto the grid cells
    pub fn sync_view(&self, grid: &mut Grid) {
        let editing = self.edit.editing_cell();
        let ids: Vec<CellId> = grid.ids().collect();
        for id in ids {
            let selected = self.selection.contains(id);
            let copied = self.clipboard.is_copied(id);
            if let Some(cell) = grid.cell_mut(id) {
                cell.flags.selected = selected;
                cell.flags.editing = editing == Some(id);
                cell.flags.copied = copied;
            }
        }
    }

    /// Forget everything tied to cell positions, e.g. when another month is shown.
    /// The clipboard buffer survives so values can be pasted across months.
    pub fn reset(&mut self) {
        self.edit.reset();
        self.drag.cancel();
        self.selection.clear_all();
        self.clipboard.clear_highlight();
        self.last_click = None;
    }
}

fn input_of(grid: &Grid, cell: CellId) -> Option<(String, String)> {
    let c = grid.cell(cell).filter(|c| c.is_input())?;
    Some((c.key()?.to_string(), c.text.clone()))
}
