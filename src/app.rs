use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{backend::Backend, Terminal};
use tracing::{debug, info};

use crate::clipboard::Clipboard;
use crate::config::AppConfig;
use crate::grid::Grid;
use crate::gridview::GridView;
use crate::input::{is_accel, KeyResult, KeyboardNavigator};
use crate::interaction::Interaction;
use crate::mode::Mode;
use crate::style::Style;
use crate::tracker::{Tracker, View};
use crate::ui;

const WHEEL_ROWS: isize = 3;

/// Line shown under the status bar until the next key
#[derive(Clone, Debug, PartialEq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

pub struct App {
    pub tracker: Tracker,
    pub grid: Grid,
    pub interaction: Interaction,
    pub view: GridView,
    pub style: Style,
    pub message: Option<StatusMessage>,
    /// Mirror copies to the system clipboard
    pub system_clipboard: bool,
    /// Waiting for y/n before the month on screen is cleared
    pub confirm_clear: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(mut tracker: Tracker, style: Style, config: &AppConfig) -> Self {
        let grid = tracker.build_grid();
        let mut view = GridView::new();
        view.reset(&grid);
        Self {
            tracker,
            grid,
            interaction: Interaction::new(config.clear_after_paste),
            view,
            style,
            message: None,
            system_clipboard: config.system_clipboard,
            confirm_clear: false,
            should_quit: false,
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit {
            self.interaction.sync_view(&mut self.grid);
            terminal.draw(|f| ui::render(f, self))?;

            // Second phase after render; draw again if it changed anything
            if self.interaction.settle() {
                continue;
            }

            if poll(Duration::from_millis(16))? {
                let event = event::read()?;
                self.handle_event(event);
            }
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                self.message = None;
                self.handle_key(key);
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        if let Some(err) = self.tracker.take_error() {
            self.message = Some(StatusMessage::Error(format!("Save failed: {}", err)));
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.confirm_clear {
            self.confirm_clear_month(key);
            return;
        }
        if is_accel(key, 'q') {
            self.interaction.commit_edit(&mut self.grid, &mut self.tracker);
            self.should_quit = true;
            return;
        }
        if is_accel(key, 'y') {
            self.switch(Tracker::toggle_view);
            return;
        }
        if is_accel(key, 'f') {
            self.switch(Tracker::cycle_funnel);
            return;
        }
        if is_accel(key, 'e') {
            self.export_selection();
            return;
        }
        if is_accel(key, 'd') {
            self.request_clear_month();
            return;
        }
        match key.code {
            KeyCode::PageUp => return self.switch(|t| t.step(false)),
            KeyCode::PageDown => return self.switch(|t| t.step(true)),
            _ => {}
        }

        let copying = is_accel(key, 'c')
            && self.interaction.mode() != Mode::Editing
            && !self.interaction.selection.is_empty();
        let result =
            KeyboardNavigator::handle_key(key, &mut self.grid, &mut self.tracker, &mut self.interaction);
        if let KeyResult::Message(msg) = result {
            self.message = Some(StatusMessage::Info(msg));
        }
        // a browse-mode copy of a non-empty selection replaces the buffer
        if copying && self.system_clipboard && !self.interaction.clipboard.is_empty() {
            self.export_selection();
        }
    }

    /// First step of clearing a month: ask before deleting anything
    fn request_clear_month(&mut self) {
        self.interaction.commit_edit(&mut self.grid, &mut self.tracker);
        self.message = Some(match self.tracker.view() {
            View::Month { .. } => {
                self.confirm_clear = true;
                let funnel = self.tracker.funnel().map(|f| f.name.clone()).unwrap_or_default();
                StatusMessage::Info(format!(
                    "Delete all data of {} for {}? (y/n)",
                    self.tracker.view().display_name(),
                    funnel
                ))
            }
            View::Year { .. } => StatusMessage::Error("Open a month to clear it".to_string()),
        });
    }

    fn confirm_clear_month(&mut self, key: KeyEvent) {
        self.confirm_clear = false;
        let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('j'));
        if !confirmed {
            self.message = Some(StatusMessage::Info("Nothing deleted".to_string()));
            return;
        }
        let name = self.tracker.view().display_name();
        if self.tracker.clear_month() {
            self.switch(|_| {});
            self.message = Some(StatusMessage::Info(format!("{} cleared", name)));
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let hit = self.view.hit(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.interaction.pointer_down(
                    &mut self.grid,
                    &mut self.tracker,
                    hit,
                    mouse.modifiers,
                    Instant::now(),
                );
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.interaction.pointer_move(&self.grid, hit);
            }
            MouseEventKind::Up(MouseButton::Left) => self.interaction.pointer_up(&self.grid),
            MouseEventKind::ScrollDown => self.view.scroll_rows(&self.grid, WHEEL_ROWS),
            MouseEventKind::ScrollUp => self.view.scroll_rows(&self.grid, -WHEEL_ROWS),
            _ => {}
        }
    }

    /// Commit any open edit, move the tracker, and rebuild the grid
    fn switch(&mut self, change: impl FnOnce(&mut Tracker)) {
        self.interaction.commit_edit(&mut self.grid, &mut self.tracker);
        change(&mut self.tracker);
        self.grid = self.tracker.build_grid();
        self.interaction.reset();
        self.view.reset(&self.grid);
        info!(view = %self.tracker.view().display_name(), "switched view");
    }

    fn export_selection(&mut self) {
        self.message = Some(match Clipboard::to_system(&self.grid, &self.interaction.selection) {
            Ok(msg) => StatusMessage::Info(msg),
            Err(e) => {
                debug!(error = %e, "system clipboard export failed");
                StatusMessage::Error(e)
            }
        });
    }
}
