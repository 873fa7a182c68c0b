use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::grid::{CellId, Grid};
use crate::interaction::Interaction;
use crate::mode::Mode;
use crate::tracker::GridHost;

/// Result of handling a key event
#[derive(Debug, PartialEq)]
pub enum KeyResult {
    /// Key consumed
    Continue,
    /// Key not bound in the current mode
    Ignored,
    /// Key consumed, show a message
    Message(String),
}

/// Check for escape key (Esc or Ctrl+[)
pub fn is_escape(key: KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('[') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Ctrl or Cmd/Super together with `ch`
pub fn is_accel(key: KeyEvent, ch: char) -> bool {
    key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER)
        && matches!(key.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&ch))
}

fn is_back_tab(key: KeyEvent) -> bool {
    key.code == KeyCode::BackTab
        || (key.code == KeyCode::Tab && key.modifiers.contains(KeyModifiers::SHIFT))
}

/// A character that starts an edit when typed on a selected cell
fn typed_char(key: KeyEvent) -> Option<char> {
    let blocked = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    match key.code {
        KeyCode::Char(c) if !key.modifiers.intersects(blocked) && !c.is_control() => Some(c),
        _ => None,
    }
}

/// Neighbour of `from` in document order among selectable cells
pub fn step_document(grid: &Grid, from: CellId, forward: bool) -> Option<CellId> {
    let cells = grid.selectable_cells();
    let idx = cells.iter().position(|&c| c == from)?;
    if forward {
        cells.get(idx + 1).copied()
    } else {
        idx.checked_sub(1).and_then(|i| cells.get(i).copied())
    }
}

/// Maps keys to selection, edit and clipboard operations, depending on mode
pub struct KeyboardNavigator;

impl KeyboardNavigator {
    pub fn handle_key(
        key: KeyEvent,
        grid: &mut Grid,
        host: &mut impl GridHost,
        ix: &mut Interaction,
    ) -> KeyResult {
        match ix.mode() {
            Mode::Editing => Self::handle_editing(key, grid, host, ix),
            Mode::Browsing | Mode::ExitingEdit => Self::handle_browsing(key, grid, host, ix),
        }
    }

    fn handle_editing(
        key: KeyEvent,
        grid: &mut Grid,
        host: &mut impl GridHost,
        ix: &mut Interaction,
    ) -> KeyResult {
        if is_escape(key) {
            ix.cancel_edit(grid, host);
            return KeyResult::Continue;
        }

        match key.code {
            KeyCode::Enter => {
                if let Some(cell) = ix.commit_edit(grid, host) {
                    if let Some(next) = grid.vertical_neighbor(cell, true) {
                        ix.select(grid, next);
                    }
                }
                KeyResult::Continue
            }
            KeyCode::Tab | KeyCode::BackTab => {
                let forward = !is_back_tab(key);
                if let Some(cell) = ix.commit_edit(grid, host) {
                    if let Some(next) = step_document(grid, cell, forward) {
                        ix.select(grid, next);
                    }
                }
                KeyResult::Continue
            }
            _ => match ix.edit.session_mut().map(|s| s.handle_key(key)) {
                Some(true) => KeyResult::Continue,
                _ => KeyResult::Ignored,
            },
        }
    }

    fn handle_browsing(
        key: KeyEvent,
        grid: &mut Grid,
        host: &mut impl GridHost,
        ix: &mut Interaction,
    ) -> KeyResult {
        if is_escape(key) {
            ix.escape();
            return KeyResult::Continue;
        }

        // these act on every selected cell and work without an anchor
        if is_accel(key, 'c') {
            return match ix.copy(grid, host) {
                0 => KeyResult::Message("Nothing to copy".to_string()),
                n => KeyResult::Message(format!("{} cell(s) copied", n)),
            };
        }
        if is_accel(key, 'v') {
            if ix.clipboard.is_empty() {
                return KeyResult::Message("Clipboard is empty".to_string());
            }
            return match ix.paste(grid, host) {
                0 => KeyResult::Message("Clipboard does not fit the selection".to_string()),
                n => KeyResult::Message(format!("{} cell(s) pasted", n)),
            };
        }
        if matches!(key.code, KeyCode::Delete | KeyCode::Backspace) {
            return match ix.clear_selected(grid, host) {
                0 => KeyResult::Continue,
                n => KeyResult::Message(format!("{} cell(s) cleared", n)),
            };
        }

        let Some(anchor) = ix.selection.anchor() else {
            return match key.code {
                KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    if let Some(&first) = grid.selectable_cells().first() {
                        ix.select(grid, first);
                    }
                    KeyResult::Continue
                }
                _ => KeyResult::Ignored,
            };
        };

        let target = match key.code {
            KeyCode::Up => grid.vertical_neighbor(anchor, false),
            KeyCode::Down => grid.vertical_neighbor(anchor, true),
            KeyCode::Left => step_document(grid, anchor, false),
            KeyCode::Right => step_document(grid, anchor, true),
            KeyCode::Tab | KeyCode::BackTab => step_document(grid, anchor, !is_back_tab(key)),
            KeyCode::Enter => {
                ix.enter_edit(grid, host, anchor);
                return KeyResult::Continue;
            }
            _ => {
                if let Some(c) = typed_char(key) {
                    ix.enter_edit_with(grid, anchor, c);
                    return KeyResult::Continue;
                }
                return KeyResult::Ignored;
            }
        };

        if let Some(target) = target {
            ix.select(grid, target);
        }
        KeyResult::Continue
    }
}
