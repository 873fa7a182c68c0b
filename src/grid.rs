pub mod layout;
pub mod region;

use std::collections::HashMap;

pub use region::{classify, Region, RowMarker, Section};

use crate::store::MonthData;

/// Position of a cell within its grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    pub row: usize,
    pub col: usize,
}

impl CellId {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellKind {
    /// Static text: column headers, weekday/date labels, spacers
    Label,
    /// Has an editable value slot backed by the value store
    Input { key: String },
    /// Readonly value produced by the recalculation hook
    Computed { key: String },
}

/// Presentation flags written by the interaction core
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellFlags {
    pub selected: bool,
    pub editing: bool,
    pub copied: bool,
}

#[derive(Clone, Debug)]
pub struct Cell {
    pub kind: CellKind,
    pub region: Region,
    pub text: String,
    /// Last value set by recalculation (computed cells only)
    pub value: Option<f64>,
    /// Column span; 0 marks a cell covered by a spanning neighbour
    pub span: usize,
    pub flags: CellFlags,
}

impl Cell {
    pub fn label(text: impl Into<String>) -> Self {
        Self::with_kind(CellKind::Label, text.into())
    }

    pub fn input(key: impl Into<String>) -> Self {
        Self::with_kind(CellKind::Input { key: key.into() }, String::new())
    }

    pub fn computed(key: impl Into<String>) -> Self {
        Self::with_kind(CellKind::Computed { key: key.into() }, "–".to_string())
    }

    /// Placeholder under a spanning label
    pub fn covered() -> Self {
        let mut cell = Self::label("");
        cell.span = 0;
        cell
    }

    pub fn spanning(mut self, span: usize) -> Self {
        self.span = span;
        self
    }

    fn with_kind(kind: CellKind, text: String) -> Self {
        Self {
            kind,
            // replaced by Grid::push_row
            region: Region::Other,
            text,
            value: None,
            span: 1,
            flags: CellFlags::default(),
        }
    }

    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            CellKind::Input { key } | CellKind::Computed { key } => Some(key),
            CellKind::Label => None,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, CellKind::Input { .. })
    }

    pub fn is_selectable(&self) -> bool {
        !matches!(self.kind, CellKind::Label)
    }
}

#[derive(Clone, Debug)]
pub struct GridRow {
    pub section: Section,
    pub marker: RowMarker,
    pub cells: Vec<Cell>,
}

/// Rendered grid: rows tagged with section and marker, cells tagged with region.
#[derive(Clone, Debug)]
pub struct Grid {
    pub title: String,
    pub columns: Vec<String>,
    /// Leading label columns kept on screen while scrolling horizontally
    pub frozen_cols: usize,
    rows: Vec<GridRow>,
}

impl Grid {
    pub fn new(title: impl Into<String>, columns: Vec<String>, frozen_cols: usize) -> Self {
        Self {
            title: title.into(),
            columns,
            frozen_cols,
            rows: Vec::new(),
        }
    }

    /// Append a row, tagging every cell with the region of its position.
    /// Short rows are padded with empty labels.
    pub fn push_row(&mut self, section: Section, marker: RowMarker, mut cells: Vec<Cell>) {
        let region = classify(section, marker);
        cells.resize_with(self.columns.len(), || Cell::label(""));
        for cell in cells.iter_mut() {
            cell.region = region;
        }
        self.rows.push(GridRow { section, marker, cells });
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&GridRow> {
        self.rows.get(idx)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.rows.get(id.row).and_then(|r| r.cells.get(id.col))
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.rows.get_mut(id.row).and_then(|r| r.cells.get_mut(id.col))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().flat_map(|r| r.cells.iter_mut())
    }

    pub fn region_of(&self, id: CellId) -> Option<Region> {
        self.cell(id).map(|c| c.region)
    }

    pub fn is_selectable(&self, id: CellId) -> bool {
        self.cell(id).map_or(false, |c| c.is_selectable())
    }

    pub fn is_input(&self, id: CellId) -> bool {
        self.cell(id).map_or(false, |c| c.is_input())
    }

    pub fn key_of(&self, id: CellId) -> Option<&str> {
        self.cell(id).and_then(|c| c.key())
    }

    pub fn find_key(&self, key: &str) -> Option<CellId> {
        self.ids().find(|&id| self.key_of(id) == Some(key))
    }

    /// Every cell position in document order (row-major)
    pub fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| (0..row.cells.len()).map(move |c| CellId::new(r, c)))
    }

    /// Selectable cells in document order
    pub fn selectable_cells(&self) -> Vec<CellId> {
        self.ids().filter(|&id| self.is_selectable(id)).collect()
    }

    /// Input cells in document order, starting at `from` (inclusive)
    pub fn input_cells_from(&self, from: CellId) -> Vec<CellId> {
        self.ids()
            .filter(|&id| id >= from && self.is_input(id))
            .collect()
    }

    /// Same column, nearest row of the same marker kind holding a selectable cell.
    pub fn vertical_neighbor(&self, id: CellId, down: bool) -> Option<CellId> {
        let marker = self.rows.get(id.row)?.marker;
        let mut row = id.row;
        loop {
            row = if down {
                row.checked_add(1).filter(|&r| r < self.rows.len())?
            } else {
                row.checked_sub(1)?
            };
            if !self.rows[row].marker.same_kind(&marker) {
                continue;
            }
            let candidate = CellId::new(row, id.col);
            if self.is_selectable(candidate) {
                return Some(candidate);
            }
        }
    }

    /// Human-readable cell name for the status bar, e.g. `Adspend 03`
    pub fn describe(&self, id: CellId) -> String {
        let col = self.columns.get(id.col).map(String::as_str).unwrap_or("?");
        let row = match self.rows.get(id.row).map(|r| r.marker) {
            Some(RowMarker::Day(d)) => format!("{:02}", d),
            Some(RowMarker::Week(w)) => format!("W{}", w),
            Some(RowMarker::Month(m)) => format!("M{:02}", m + 1),
            Some(RowMarker::Quarter(q)) => format!("Q{}", q),
            Some(RowMarker::Summary) | Some(RowMarker::YearSummary) => "TOTAL".to_string(),
            _ => format!("#{}", id.row),
        };
        format!("{} {}", col, row)
    }

    /// Resync input texts from stored data.
    pub fn sync_inputs(&mut self, data: &MonthData, format: impl Fn(f64, &str) -> String) {
        for cell in self.cells_mut() {
            if let CellKind::Input { key } = &cell.kind {
                cell.text = data.get(key).map(|&v| format(v, key)).unwrap_or_default();
            }
        }
    }

    /// Set value and text of every computed cell; keys missing from `values` show `–`.
    pub fn apply_computed(&mut self, values: &HashMap<String, f64>, format: impl Fn(f64, &str) -> String) {
        for cell in self.cells_mut() {
            if let CellKind::Computed { key } = &cell.kind {
                let value = values.get(key).copied().filter(|v| v.is_finite());
                cell.text = value.map(|v| format(v, key)).unwrap_or_else(|| "–".to_string());
                cell.value = value;
            }
        }
    }
}
