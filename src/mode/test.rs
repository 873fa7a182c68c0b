use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::drag::{DragController, DragState};
use super::edit::{EditController, EditState};
use super::Mode;
use crate::funnel::FunnelConfig;
use crate::grid::layout::month_grid;
use crate::grid::{CellId, Grid};
use crate::selection::Selection;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

// April 2025, columns Tag, Datum, Clicks, Leads, LP-%; weeks are rows 35..=39
fn grid() -> Grid {
    let modules = vec!["organic".to_string(), "classic-vsl-no-survey-organic".to_string()];
    month_grid(&FunnelConfig::from_modules("t", "T", &modules), 2025, 3)
}

fn id(row: usize, col: usize) -> CellId {
    CellId::new(row, col)
}

#[test]
fn test_enter_and_exit_edit() {
    let mut edit = EditController::new();
    assert_eq!(edit.mode(), Mode::Browsing);

    assert!(edit.enter(id(1, 2), "42".to_string(), "42".to_string()));
    assert_eq!(edit.mode(), Mode::Editing);
    assert_eq!(edit.editing_cell(), Some(id(1, 2)));

    let session = edit.exit().unwrap();
    assert_eq!(session.buffer, "42");
    assert_eq!(edit.state(), &EditState::ExitingEdit { cell: id(1, 2) });

    assert!(edit.settle());
    assert_eq!(edit.mode(), Mode::Browsing);
    assert!(!edit.settle());
}

#[test]
fn test_exiting_edit_guards_reentry() {
    let mut edit = EditController::new();
    edit.enter(id(1, 2), String::new(), String::new());
    edit.exit();

    assert!(!edit.enter(id(2, 2), String::new(), String::new()));
    assert!(edit.exit().is_none());
    assert_eq!(edit.mode(), Mode::ExitingEdit);

    edit.settle();
    assert!(edit.enter(id(2, 2), String::new(), String::new()));
}

#[test]
fn test_enter_refused_while_editing() {
    let mut edit = EditController::new();
    edit.enter(id(1, 2), String::new(), String::new());
    assert!(!edit.enter(id(2, 2), String::new(), String::new()));
    assert_eq!(edit.editing_cell(), Some(id(1, 2)));
}

#[test]
fn test_select_all_is_deferred_until_settle() {
    let mut edit = EditController::new();
    edit.enter(id(1, 2), "1234,5".to_string(), "1.234,50 €".to_string());
    assert!(!edit.session().unwrap().all_selected);

    edit.settle();
    assert!(edit.session().unwrap().all_selected);

    // typing overwrites the selected text
    edit.session_mut().unwrap().handle_key(key(KeyCode::Char('7')));
    assert_eq!(edit.session().unwrap().buffer, "7");
    assert!(!edit.session().unwrap().all_selected);
}

#[test]
fn test_empty_buffer_is_not_selected() {
    let mut edit = EditController::new();
    edit.enter(id(1, 2), String::new(), String::new());
    edit.settle();
    assert!(!edit.session().unwrap().all_selected);
}

#[test]
fn test_enter_with_seeds_character() {
    let mut edit = EditController::new();
    assert!(edit.enter_with(id(1, 2), '5', "42".to_string()));
    edit.settle();
    let session = edit.session().unwrap();
    assert_eq!(session.buffer, "5");
    assert_eq!(session.cursor, 1);
    assert!(!session.all_selected);
    assert_eq!(session.original, "42");
}

#[test]
fn test_buffer_editing_keys() {
    let mut edit = EditController::new();
    edit.enter_with(id(1, 2), '1', String::new());
    let s = edit.session_mut().unwrap();

    s.handle_key(key(KeyCode::Char('2')));
    s.handle_key(key(KeyCode::Char('3')));
    s.handle_key(key(KeyCode::Left));
    s.handle_key(key(KeyCode::Backspace));
    assert_eq!(s.buffer, "13");
    assert_eq!(s.cursor, 1);

    s.handle_key(key(KeyCode::Home));
    s.handle_key(key(KeyCode::Char('€')));
    s.handle_key(key(KeyCode::Delete));
    assert_eq!(s.buffer, "€3");

    s.handle_key(key(KeyCode::End));
    s.handle_key(key(KeyCode::Char(',')));
    assert_eq!(s.buffer, "€3,");

    assert!(!s.handle_key(key(KeyCode::Enter)));
    assert!(!s.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
}

#[test]
fn test_reset_drops_edit() {
    let mut edit = EditController::new();
    edit.enter(id(1, 2), "9".to_string(), "9".to_string());
    edit.reset();
    assert_eq!(edit.mode(), Mode::Browsing);
    assert!(!edit.settle());
}

#[test]
fn test_click_without_move_selects_start() {
    let g = grid();
    let mut sel = Selection::new();
    let mut drag = DragController::new();
    sel.select(&g, id(5, 2), false);

    drag.pointer_down(&g, &mut sel, id(3, 3), KeyModifiers::NONE);
    // press alone does not touch the selection
    assert_eq!(sel.cells(), &[id(5, 2)]);
    assert!(drag.is_dragging());

    drag.pointer_up(&g, &mut sel);
    assert_eq!(sel.cells(), &[id(3, 3)]);
    assert_eq!(drag.state(), DragState::Idle);
}

#[test]
fn test_click_on_selected_cell_keeps_it_alone() {
    let g = grid();
    let mut sel = Selection::new();
    let mut drag = DragController::new();
    sel.range(&g, id(3, 2), id(4, 2));

    drag.pointer_down(&g, &mut sel, id(3, 2), KeyModifiers::NONE);
    drag.pointer_move(&g, &mut sel, id(3, 2));
    drag.pointer_up(&g, &mut sel);
    assert_eq!(sel.cells(), &[id(3, 2)]);
}

#[test]
fn test_drag_selects_rectangle() {
    let g = grid();
    let mut sel = Selection::new();
    let mut drag = DragController::new();

    drag.pointer_down(&g, &mut sel, id(2, 2), KeyModifiers::NONE);
    assert!(drag.pointer_move(&g, &mut sel, id(3, 3)));
    assert_eq!(sel.cells(), &[id(2, 2), id(2, 3), id(3, 2), id(3, 3)]);

    drag.pointer_up(&g, &mut sel);
    assert_eq!(sel.len(), 4);
    assert_eq!(sel.anchor(), Some(id(2, 2)));
}

#[test]
fn test_drag_ignores_other_regions() {
    let g = grid();
    let mut sel = Selection::new();
    let mut drag = DragController::new();

    drag.pointer_down(&g, &mut sel, id(29, 2), KeyModifiers::NONE);
    drag.pointer_move(&g, &mut sel, id(30, 3));
    // moving onto a weekly cell changes nothing
    assert!(!drag.pointer_move(&g, &mut sel, id(36, 3)));
    assert_eq!(sel.len(), 4);
    // a label is not in the session region either
    assert!(!drag.pointer_move(&g, &mut sel, id(33, 2)));

    drag.pointer_up(&g, &mut sel);
    assert_eq!(sel.cells(), &[id(29, 2), id(29, 3), id(30, 2), id(30, 3)]);
}

#[test]
fn test_drag_rect_skips_cells_of_other_regions() {
    let g = grid();
    let mut sel = Selection::new();
    let mut drag = DragController::new();

    // weekly drag: rectangle from week 1 to week 3 never includes body cells
    drag.pointer_down(&g, &mut sel, id(35, 2), KeyModifiers::NONE);
    drag.pointer_move(&g, &mut sel, id(37, 4));
    drag.pointer_up(&g, &mut sel);
    assert_eq!(sel.len(), 9);
    assert!(sel.cells().iter().all(|c| (35..=37).contains(&c.row)));
}

#[test]
fn test_shift_click_ranges_from_anchor() {
    let g = grid();
    let mut sel = Selection::new();
    let mut drag = DragController::new();
    sel.select(&g, id(1, 3), false);

    drag.pointer_down(&g, &mut sel, id(2, 3), KeyModifiers::SHIFT);
    assert!(!drag.is_dragging());
    assert_eq!(sel.cells(), &[id(1, 3), id(1, 4), id(2, 2), id(2, 3)]);

    // shift-click into another region is ignored
    drag.pointer_down(&g, &mut sel, id(36, 3), KeyModifiers::SHIFT);
    assert_eq!(sel.len(), 4);
}

#[test]
fn test_ctrl_click_toggles() {
    let g = grid();
    let mut sel = Selection::new();
    let mut drag = DragController::new();
    sel.select(&g, id(1, 2), false);

    drag.pointer_down(&g, &mut sel, id(4, 2), KeyModifiers::CONTROL);
    assert_eq!(sel.cells(), &[id(1, 2), id(4, 2)]);
    drag.pointer_down(&g, &mut sel, id(1, 2), KeyModifiers::SUPER);
    assert_eq!(sel.cells(), &[id(4, 2)]);
    assert!(!drag.is_dragging());
}

#[test]
fn test_press_on_label_arms_nothing() {
    let g = grid();
    let mut sel = Selection::new();
    let mut drag = DragController::new();
    drag.pointer_down(&g, &mut sel, id(1, 0), KeyModifiers::NONE);
    assert!(!drag.is_dragging());
    drag.pointer_up(&g, &mut sel);
    assert!(sel.is_empty());
}
