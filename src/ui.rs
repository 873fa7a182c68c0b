use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style as RatStyle},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, StatusMessage};
use crate::grid::{Cell, CellId, CellKind, Grid};
use crate::gridview::GridView;
use crate::interaction::Interaction;
use crate::mode::edit::EditSession;
use crate::style::Style;

const KEY_HINTS: &str = "PgUp/PgDn month · ^Y year · ^F funnel · ^D clear · ^Q quit";

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.size();
    if let Some(bg) = app.style.background() {
        frame.render_widget(Block::default().style(RatStyle::default().bg(bg)), area);
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_title(frame, app, chunks[0]);
    render_grid(frame, &app.grid, &app.interaction, &app.style, &mut app.view, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
    render_message_line(frame, app, chunks[3]);
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" {}", app.grid.title);
    let pad = (area.width as usize).saturating_sub(title.width() + KEY_HINTS.width() + 1);
    let line = Line::from(vec![
        Span::styled(title, app.style.title()),
        Span::raw(" ".repeat(pad)),
        Span::styled(KEY_HINTS, app.style.status_bar()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Cell text cut or padded to exactly `width` display columns
fn fit(text: &str, width: usize, right: bool) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    let pad = " ".repeat(width - used);
    if right {
        pad + &out
    } else {
        out + &pad
    }
}

/// Edit buffer with a block caret, scrolled so the caret stays inside `width`
fn edit_spans(session: &EditSession, width: usize, base: RatStyle) -> Vec<Span<'static>> {
    if width == 0 {
        return Vec::new();
    }
    let caret = base.add_modifier(Modifier::REVERSED);
    if session.all_selected {
        let marked = fit(&session.buffer, session.buffer.width().min(width), false);
        let rest = " ".repeat(width - marked.width());
        return vec![Span::styled(marked, caret), Span::styled(rest, base)];
    }

    let chars: Vec<char> = session.buffer.chars().collect();
    let cursor = session.cursor.min(chars.len());
    let mut before: String = chars[..cursor].iter().collect();
    let at = chars.get(cursor).copied().unwrap_or(' ');
    let after: String = chars.get(cursor + 1..).map(|c| c.iter().collect()).unwrap_or_default();

    let budget = width.saturating_sub(at.width().unwrap_or(1));
    while before.width() > budget {
        before.remove(0);
    }
    let after = fit(&after, budget - before.width(), false);
    vec![
        Span::styled(before, base),
        Span::styled(at.to_string(), caret),
        Span::styled(after, base),
    ]
}

fn cell_spans(
    cell: &Cell,
    width: usize,
    session: Option<&EditSession>,
    style: &Style,
) -> Vec<Span<'static>> {
    let base = style.cell(cell);
    if let Some(session) = session.filter(|_| cell.flags.editing) {
        return edit_spans(session, width, base);
    }
    let right = !matches!(cell.kind, CellKind::Label);
    vec![Span::styled(fit(&cell.text, width, right), base)]
}

/// Draw one grid row across the laid-out columns, recording hit boxes
#[allow(clippy::too_many_arguments)]
fn row_line(
    grid: &Grid,
    row: usize,
    y: u16,
    columns: &[(usize, u16)],
    view: &GridView,
    area: Rect,
    session: Option<&EditSession>,
    style: &Style,
    hits: &mut Vec<(Rect, CellId)>,
) -> Line<'static> {
    let mut spans = Vec::new();
    let mut x = 0u16;
    let Some(grid_row) = grid.row(row) else {
        return Line::default();
    };

    for (idx, &(col, col_x)) in columns.iter().enumerate() {
        let Some(cell) = grid_row.cells.get(col) else {
            continue;
        };
        if cell.span == 0 {
            continue;
        }
        // spanning cells cover every laid-out column inside their span
        let last = columns[idx..]
            .iter()
            .take_while(|&&(c, _)| c < col + cell.span)
            .last()
            .copied()
            .unwrap_or((col, col_x));
        let end = last.1 + view.width_of(last.0) as u16;
        let width = end.saturating_sub(col_x).min(area.width.saturating_sub(col_x));

        if col_x > x {
            spans.push(Span::raw(" ".repeat((col_x - x) as usize)));
        }
        spans.extend(cell_spans(cell, width as usize, session, style));
        hits.push((Rect::new(area.x + col_x, y, width, 1), CellId::new(row, col)));
        x = col_x + width;
    }
    Line::from(spans)
}

fn render_grid(
    frame: &mut Frame,
    grid: &Grid,
    interaction: &Interaction,
    style: &Style,
    view: &mut GridView,
    area: Rect,
) {
    if grid.col_count() == 0 || area.height == 0 {
        view.set_hits(Vec::new());
        return;
    }
    if view.col_widths.len() != grid.col_count() {
        view.reset(grid);
    }
    view.update_col_widths(grid);

    let pinned = GridView::pinned_rows(grid).min(area.height as usize);
    view.visible_rows = (area.height as usize).saturating_sub(pinned);
    let scrollable = view
        .layout_columns(grid, area.width)
        .iter()
        .filter(|&&(c, _)| c >= grid.frozen_cols)
        .count();
    view.visible_cols = scrollable.max(1);

    let focus = interaction.edit.editing_cell().or(interaction.selection.anchor());
    view.follow(grid, focus);

    let columns = view.layout_columns(grid, area.width);
    let session = interaction.edit.session();
    let body = (pinned + view.viewport_row..grid.row_count()).take(view.visible_rows);

    let mut hits = Vec::new();
    let lines: Vec<Line> = (0..pinned)
        .chain(body)
        .enumerate()
        .map(|(i, row)| {
            let y = area.y + i as u16;
            row_line(grid, row, y, &columns, view, area, session, style, &mut hits)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
    view.set_hits(hits);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode = app.interaction.mode();
    let funnel = app.tracker.funnel().map(|f| f.name.clone()).unwrap_or_default();

    let position = match app.interaction.selection.anchor() {
        Some(anchor) => {
            let count = app.interaction.selection.len();
            if count > 1 {
                format!("{} ({} selected) ", app.grid.describe(anchor), count)
            } else {
                format!("{} ", app.grid.describe(anchor))
            }
        }
        None => match app.interaction.edit.editing_cell() {
            Some(cell) => format!("{} ", app.grid.describe(cell)),
            None => String::new(),
        },
    };

    let left = format!(" {} · {}", funnel, app.tracker.view().display_name());
    let mode_label = format!(" {} ", mode.display_name());
    let used = mode_label.width() + left.width() + position.width();

    let status = Line::from(vec![
        Span::styled(mode_label, app.style.status_mode(mode).add_modifier(Modifier::BOLD)),
        Span::raw(left),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::raw(position),
    ]);

    frame.render_widget(Paragraph::new(status).style(app.style.status_bar()), area);
}

fn render_message_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.message {
        Some(StatusMessage::Info(msg)) => Line::from(Span::styled(msg.clone(), app.style.message_info())),
        Some(StatusMessage::Error(msg)) => Line::from(Span::styled(msg.clone(), app.style.message_error())),
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellId;

    fn session(buffer: &str, cursor: usize, all_selected: bool) -> EditSession {
        EditSession {
            cell: CellId::new(1, 2),
            buffer: buffer.to_string(),
            cursor,
            original: String::new(),
            all_selected,
        }
    }

    fn text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("12", 5, true), "   12");
        assert_eq!(fit("Adspend", 4, false), "Adsp");
        assert_eq!(fit("–", 3, false), "–  ");
        assert_eq!(fit("", 0, true), "");
    }

    #[test]
    fn test_edit_caret() {
        let spans = edit_spans(&session("123", 1, false), 6, RatStyle::default());
        assert_eq!(text(&spans), "123   ");
        assert_eq!(spans[1].content, "2");
        assert!(spans[1].style.add_modifier.contains(Modifier::REVERSED));

        // caret past the end is a blank block
        let spans = edit_spans(&session("12", 2, false), 4, RatStyle::default());
        assert_eq!(text(&spans), "12  ");
        assert_eq!(spans[1].content, " ");
    }

    #[test]
    fn test_edit_scrolls_to_caret() {
        let spans = edit_spans(&session("123456", 6, false), 4, RatStyle::default());
        assert_eq!(text(&spans), "456 ");
    }

    #[test]
    fn test_edit_all_selected() {
        let spans = edit_spans(&session("1,5", 3, true), 5, RatStyle::default());
        assert_eq!(spans[0].content, "1,5");
        assert!(spans[0].style.add_modifier.contains(Modifier::REVERSED));
        assert_eq!(spans[1].content, "  ");
    }
}
