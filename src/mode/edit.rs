use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::Mode;
use crate::grid::CellId;

/// The single cell being edited
#[derive(Clone, Debug, PartialEq)]
pub struct EditSession {
    pub cell: CellId,
    pub buffer: String,
    /// Caret as character index, not byte index
    pub cursor: usize,
    /// Text the cell showed when editing started
    pub original: String,
    /// Typing replaces the whole buffer
    pub all_selected: bool,
}

impl EditSession {
    fn new(cell: CellId, buffer: String, original: String) -> Self {
        let cursor = buffer.chars().count();
        Self { cell, buffer, cursor, original, all_selected: false }
    }

    fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }

    fn replace_all(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.char_count();
        self.all_selected = false;
    }

    /// Apply one editing key to the buffer. Returns false for keys that are
    /// not buffer edits (they belong to the navigator).
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER);

        match key.code {
            KeyCode::Char('a') if ctrl => {
                self.all_selected = !self.buffer.is_empty();
                self.cursor = self.char_count();
            }
            KeyCode::Char(_) if ctrl => return false,
            KeyCode::Char(c) => {
                if self.all_selected {
                    self.replace_all(&c.to_string());
                } else {
                    let at = self.byte_index(self.cursor);
                    self.buffer.insert(at, c);
                    self.cursor += 1;
                }
            }
            KeyCode::Backspace | KeyCode::Delete if self.all_selected => {
                self.replace_all("");
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.char_count() {
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
            }
            KeyCode::Left => {
                self.all_selected = false;
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.all_selected = false;
                self.cursor = (self.cursor + 1).min(self.char_count());
            }
            KeyCode::Home => {
                self.all_selected = false;
                self.cursor = 0;
            }
            KeyCode::End => {
                self.all_selected = false;
                self.cursor = self.char_count();
            }
            _ => return false,
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditState {
    Browsing,
    Editing(EditSession),
    /// Edit on `cell` ended this frame
    ExitingEdit { cell: CellId },
}

/// Work that must wait until the view has been redrawn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deferred {
    SelectAll,
    FinishExit,
}

/// Browsing / Editing / ExitingEdit state machine.
///
/// Side effects that depend on the view having caught up (selecting the
/// text of a freshly opened editor, accepting new edits after an exit) are
/// queued and applied by [`EditController::settle`], which the shell calls
/// once per frame after drawing.
#[derive(Debug)]
pub struct EditController {
    state: EditState,
    deferred: Vec<Deferred>,
}

impl Default for EditController {
    fn default() -> Self {
        Self::new()
    }
}

impl EditController {
    pub fn new() -> Self {
        Self { state: EditState::Browsing, deferred: Vec::new() }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        match self.state {
            EditState::Browsing => Mode::Browsing,
            EditState::Editing(_) => Mode::Editing,
            EditState::ExitingEdit { .. } => Mode::ExitingEdit,
        }
    }

    pub fn session(&self) -> Option<&EditSession> {
        match &self.state {
            EditState::Editing(s) => Some(s),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        match &mut self.state {
            EditState::Editing(s) => Some(s),
            _ => None,
        }
    }

    pub fn editing_cell(&self) -> Option<CellId> {
        self.session().map(|s| s.cell)
    }

    /// Open an editor on `cell` holding `buffer`. Refused while another edit
    /// is open or one is still exiting. A non-empty buffer gets selected as
    /// a whole on the next settle.
    pub fn enter(&mut self, cell: CellId, buffer: String, original: String) -> bool {
        if !matches!(self.state, EditState::Browsing) {
            return false;
        }
        let select_all = !buffer.is_empty();
        self.state = EditState::Editing(EditSession::new(cell, buffer, original));
        if select_all {
            self.deferred.push(Deferred::SelectAll);
        }
        true
    }

    /// Open an editor seeded with one typed character (caret after it)
    pub fn enter_with(&mut self, cell: CellId, ch: char, original: String) -> bool {
        self.enter(cell, String::new(), original) && {
            if let Some(s) = self.session_mut() {
                s.replace_all(&ch.to_string());
            }
            true
        }
    }

    /// Close the open editor and hand its session back to the caller, who
    /// commits or discards it. Moves to `ExitingEdit` until the next settle.
    pub fn exit(&mut self) -> Option<EditSession> {
        let cell = self.editing_cell()?;
        let EditState::Editing(session) =
            std::mem::replace(&mut self.state, EditState::ExitingEdit { cell })
        else {
            return None;
        };
        self.deferred.retain(|d| *d != Deferred::SelectAll);
        self.deferred.push(Deferred::FinishExit);
        Some(session)
    }

    /// Apply deferred work. Returns true if anything changed.
    pub fn settle(&mut self) -> bool {
        let mut changed = false;
        for task in std::mem::take(&mut self.deferred) {
            match task {
                Deferred::SelectAll => {
                    if let EditState::Editing(s) = &mut self.state {
                        s.all_selected = !s.buffer.is_empty();
                        changed = true;
                    }
                }
                Deferred::FinishExit => {
                    if matches!(self.state, EditState::ExitingEdit { .. }) {
                        self.state = EditState::Browsing;
                        changed = true;
                    }
                }
            }
        }
        changed
    }

    /// Drop any edit without side effects, e.g. when the grid is rebuilt
    pub fn reset(&mut self) {
        self.state = EditState::Browsing;
        self.deferred.clear();
    }
}
