pub mod drag;
pub mod edit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Cells are selectable, keys navigate
    Browsing,
    /// One input cell owns the keyboard
    Editing,
    /// An edit just ended; new edits are refused until the next settle
    ExitingEdit,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Browsing => "BROWSE",
            Mode::Editing => "EDIT",
            Mode::ExitingEdit => "BROWSE",
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Mode::Editing)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Browsing
    }
}

#[cfg(test)]
mod test;
