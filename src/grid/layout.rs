//! Builds the month and year grids of a funnel.
//!
//! Month grid: column header, one body row per day, then a footer with the
//! merged `TOTAL` block, a spacer and five weekly rows. Year grid: column
//! header, twelve month rows, then `TOTAL`, a spacer and four quarter rows.

use chrono::{Datelike, NaiveDate, Weekday};

use super::{Cell, Grid, RowMarker, Section};
use crate::funnel::FunnelConfig;
use crate::kpi::{bucket_week_label, days_in_month, week_buckets, MAX_WEEKS};

pub const MONTH_NAMES: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni",
    "Juli", "August", "September", "Oktober", "November", "Dezember",
];

const MONTH_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez",
];

fn weekday_letter(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "M",
        Weekday::Tue => "D",
        Weekday::Wed => "M",
        Weekday::Thu => "D",
        Weekday::Fri => "F",
        Weekday::Sat | Weekday::Sun => "S",
    }
}

fn header_row(grid: &mut Grid) {
    let cells = grid.columns.iter().map(Cell::label).collect();
    grid.push_row(Section::Head, RowMarker::ColumnHeader, cells);
}

/// Label row under a merged `TOTAL` block spanning the leading columns
fn total_head_row(grid: &mut Grid, marker: RowMarker, data_cols: &[String], lead: usize) {
    let mut cells = vec![Cell::label("TOTAL").spanning(lead)];
    cells.extend((1..lead).map(|_| Cell::covered()));
    cells.extend(data_cols.iter().map(Cell::label));
    grid.push_row(Section::Foot, marker, cells);
}

fn total_value_row(grid: &mut Grid, marker: RowMarker, data_cols: &[String], lead: usize) {
    let mut cells: Vec<Cell> = (0..lead).map(|_| Cell::covered()).collect();
    cells.extend(data_cols.iter().map(Cell::computed));
    grid.push_row(Section::Foot, marker, cells);
}

fn spacer_row(grid: &mut Grid) {
    let width = grid.col_count();
    let mut cells = vec![Cell::label("").spanning(width)];
    cells.extend((1..width).map(|_| Cell::covered()));
    grid.push_row(Section::Foot, RowMarker::Spacer, cells);
}

/// Grid of one funnel month (`month` is 0-based)
pub fn month_grid(funnel: &FunnelConfig, year: i32, month: u32) -> Grid {
    let title = format!(
        "{} · {} {}",
        funnel.name,
        MONTH_NAMES.get(month as usize).copied().unwrap_or("?"),
        year
    );
    let mut grid = Grid::new(title, funnel.columns.clone(), 2);
    let data_cols: Vec<String> = funnel.columns.iter().skip(2).cloned().collect();

    header_row(&mut grid);

    for day in 1..=days_in_month(year, month) {
        let date = NaiveDate::from_ymd_opt(year, month + 1, day);
        let mut cells = vec![
            Cell::label(date.map_or("", |d| weekday_letter(d.weekday()))),
            Cell::label(date.map(|d| d.format("%d.%m.%y").to_string()).unwrap_or_default()),
        ];
        for col in &data_cols {
            let key = format!("{}_{}", col, day);
            cells.push(if funnel.is_input(col) { Cell::input(key) } else { Cell::computed(key) });
        }
        grid.push_row(Section::Body, RowMarker::Day(day), cells);
    }

    total_head_row(&mut grid, RowMarker::SummaryHead, &data_cols, 2);
    total_value_row(&mut grid, RowMarker::Summary, &data_cols, 2);
    spacer_row(&mut grid);

    let mut weekly_head = vec![Cell::label("WEEKLY").spanning(2), Cell::covered()];
    weekly_head.extend(data_cols.iter().map(Cell::label));
    grid.push_row(Section::Foot, RowMarker::WeeklyHeader, weekly_head);

    let buckets = week_buckets(year, month);
    for week in 1..=MAX_WEEKS as u32 {
        let kw = buckets
            .get(week as usize - 1)
            .map(|b| bucket_week_label(year, month, b))
            .unwrap_or_else(|| "—".to_string());
        let mut cells = vec![Cell::label(week.to_string()), Cell::label(kw)];
        cells.extend(data_cols.iter().map(|c| Cell::computed(format!("{}_W{}", c, week))));
        grid.push_row(Section::Foot, RowMarker::Week(week), cells);
    }

    grid
}

/// Grid of one funnel year: months, total and quarters
pub fn year_grid(funnel: &FunnelConfig, year: i32) -> Grid {
    let columns = funnel.year_columns();
    let data_cols: Vec<String> = columns.iter().skip(1).cloned().collect();
    let mut grid = Grid::new(format!("{} · {}", funnel.name, year), columns, 1);

    header_row(&mut grid);

    for (m, name) in MONTH_SHORT.iter().enumerate() {
        let mut cells = vec![Cell::label(*name)];
        cells.extend(data_cols.iter().map(|c| Cell::computed(format!("{}_M{}", c, m + 1))));
        grid.push_row(Section::Body, RowMarker::Month(m as u32), cells);
    }

    total_head_row(&mut grid, RowMarker::YearHead, &data_cols, 1);
    total_value_row(&mut grid, RowMarker::YearSummary, &data_cols, 1);
    spacer_row(&mut grid);

    let mut quarter_head = vec![Cell::label("Quartal")];
    quarter_head.extend(data_cols.iter().map(Cell::label));
    grid.push_row(Section::Foot, RowMarker::QuarterHeader, quarter_head);

    for q in 1..=4u32 {
        let mut cells = vec![Cell::label(format!("Q{}", q))];
        cells.extend(data_cols.iter().map(|c| Cell::computed(format!("{}_Q{}", c, q))));
        grid.push_row(Section::Foot, RowMarker::Quarter(q), cells);
    }

    grid
}
