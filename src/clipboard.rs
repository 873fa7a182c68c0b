use tracing::debug;

use crate::grid::{CellId, Grid};
use crate::selection::Selection;
use crate::tracker::GridHost;

/// One captured value
#[derive(Clone, Debug, PartialEq)]
pub struct ClipEntry {
    pub cell: CellId,
    pub key: String,
    pub value: f64,
}

/// How buffer entries map onto the paste target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasteShape {
    /// One entry written to every selected cell
    Broadcast,
    /// Entries written to consecutive input cells starting at the single selected cell
    Sequential,
    /// Entry `i` written to selected cell `i`
    Zip,
}

pub struct Clipboard {
    buffer: Vec<ClipEntry>,
    /// Captured cells stay highlighted until a paste or Escape
    highlight: bool,
    pub clear_after_paste: bool,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            highlight: false,
            clear_after_paste: true,
        }
    }

    pub fn entries(&self) -> &[ClipEntry] {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_copied(&self, cell: CellId) -> bool {
        self.highlight && self.buffer.iter().any(|e| e.cell == cell)
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = false;
    }

    /// Replace the buffer with the values of the selected cells, in selection
    /// order. Input cells are read through the host, computed cells use their
    /// last computed value; cells without a value are skipped. An empty
    /// selection keeps the previous buffer. Returns the number of entries.
    pub fn capture(&mut self, grid: &Grid, selection: &Selection, host: &impl GridHost) -> usize {
        if selection.is_empty() {
            return 0;
        }

        self.buffer = selection
            .cells()
            .iter()
            .filter_map(|&id| {
                let cell = grid.cell(id)?;
                let key = cell.key()?;
                let value = match cell.is_input() {
                    true => host.read(key),
                    false => cell.value,
                }?;
                Some(ClipEntry { cell: id, key: key.to_string(), value })
            })
            .collect();
        self.highlight = !self.buffer.is_empty();

        debug!(entries = self.buffer.len(), "captured selection");
        self.buffer.len()
    }

    /// Shape rule that applies to a paste onto `targets` selected cells
    pub fn shape(&self, targets: usize) -> Option<PasteShape> {
        match (self.buffer.len(), targets) {
            (0, _) | (_, 0) => None,
            (1, _) => Some(PasteShape::Broadcast),
            (_, 1) => Some(PasteShape::Sequential),
            (n, m) if n == m => Some(PasteShape::Zip),
            _ => None,
        }
    }

    /// Write the buffer onto the selection. Only input cells receive values;
    /// the recalculation hook runs once afterwards. Returns the number of
    /// cells written (0 when no shape rule applies).
    pub fn replay(&mut self, grid: &mut Grid, selection: &Selection, host: &mut impl GridHost) -> usize {
        let Some(shape) = self.shape(selection.len()) else {
            return 0;
        };

        let targets: Vec<(CellId, f64)> = match shape {
            PasteShape::Broadcast => {
                let value = self.buffer[0].value;
                selection.cells().iter().map(|&id| (id, value)).collect()
            }
            PasteShape::Sequential => grid
                .input_cells_from(selection.cells()[0])
                .into_iter()
                .zip(self.buffer.iter().map(|e| e.value))
                .collect(),
            PasteShape::Zip => selection
                .cells()
                .iter()
                .copied()
                .zip(self.buffer.iter().map(|e| e.value))
                .collect(),
        };

        let mut updates = Vec::new();
        for (id, value) in targets {
            let Some(key) = grid.cell(id).filter(|c| c.is_input()).and_then(|c| c.key()) else {
                continue;
            };
            let key = key.to_string();
            let text = host.format(value, &key);
            if let Some(cell) = grid.cell_mut(id) {
                cell.text = text;
            }
            updates.push((key, Some(value)));
        }

        let written = updates.len();
        if written > 0 {
            host.write_many(&updates);
            host.recalculate(grid);
            self.highlight = false;
            if self.clear_after_paste {
                self.buffer.clear();
            }
        }
        debug!(?shape, written, "pasted");
        written
    }

    /// Selection as tab-separated display text: one line per row holding a
    /// selected cell, columns spanning the selection's bounding box
    pub fn to_tsv(grid: &Grid, selection: &Selection) -> Option<String> {
        let cells = selection.cells();
        let c0 = cells.iter().map(|c| c.col).min()?;
        let c1 = cells.iter().map(|c| c.col).max()?;
        let mut rows: Vec<usize> = cells.iter().map(|c| c.row).collect();
        rows.sort_unstable();
        rows.dedup();

        let lines: Vec<String> = rows
            .iter()
            .map(|&r| {
                (c0..=c1)
                    .map(|c| {
                        let id = CellId::new(r, c);
                        match grid.cell(id) {
                            Some(cell) if selection.contains(id) => cell.text.clone(),
                            _ => String::new(),
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect();
        Some(lines.join("\n"))
    }

    /// Copy the selection to the system clipboard as TSV
    pub fn to_system(grid: &Grid, selection: &Selection) -> Result<String, String> {
        let tsv = Self::to_tsv(grid, selection).ok_or_else(|| "Nothing to copy".to_string())?;
        copy_to_system_clipboard(&tsv)?;
        Ok(format!("Copied {} cell(s) to system clipboard", selection.len()))
    }
}

/// Copy text to system clipboard using platform-appropriate method
fn copy_to_system_clipboard(text: &str) -> Result<(), String> {
    // Command-line tools are more reliable than arboard from inside a terminal on Linux
    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let commands = [
            ("wl-copy", vec![]),
            ("xclip", vec!["-selection", "clipboard"]),
            ("xsel", vec!["--clipboard", "--input"]),
        ];

        for (cmd, args) in commands {
            if let Ok(mut child) = Command::new(cmd)
                .args(&args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                if let Some(mut stdin) = child.stdin.take() {
                    if stdin.write_all(text.as_bytes()).is_ok() {
                        drop(stdin);
                        if child.wait().map(|s| s.success()).unwrap_or(false) {
                            return Ok(());
                        }
                    }
                }
            }
        }

        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| format!("No clipboard available (install xclip or wl-copy): {}", e))?;
        clipboard
            .set_text(text)
            .map_err(|e| format!("Clipboard error: {}", e))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| format!("Clipboard error: {}", e))?;
        clipboard
            .set_text(text)
            .map_err(|e| format!("Clipboard error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::FunnelConfig;
    use crate::store::MemoryStore;
    use crate::tracker::{Tracker, View};

    // April 2025, columns Tag, Datum, Clicks, Leads, LP-%.
    // Days are rows 1..=30, summary 32, weeks 35..=39.
    fn setup() -> (Tracker, Grid) {
        let modules = vec!["organic".to_string(), "classic-vsl-no-survey-organic".to_string()];
        let funnels = vec![FunnelConfig::from_modules("t", "T", &modules)];
        let mut tracker =
            Tracker::new(Box::new(MemoryStore::new()), funnels, View::Month { year: 2025, month: 3 });
        for day in 1..=3 {
            tracker.write(&format!("Clicks_{}", day), Some(day as f64));
        }
        let grid = tracker.build_grid();
        (tracker, grid)
    }

    fn id(row: usize, col: usize) -> CellId {
        CellId::new(row, col)
    }

    fn select(grid: &Grid, cells: &[CellId]) -> Selection {
        let mut sel = Selection::new();
        for &c in cells {
            sel.select(grid, c, true);
        }
        sel
    }

    #[test]
    fn test_capture_skips_cells_without_value() {
        let (tracker, grid) = setup();
        let mut clip = Clipboard::new();
        let sel = select(&grid, &[id(1, 2), id(1, 3), id(2, 2)]);

        assert_eq!(clip.capture(&grid, &sel, &tracker), 2);
        assert_eq!(clip.entries()[0].key, "Clicks_1");
        assert_eq!(clip.entries()[1].value, 2.0);
        assert!(clip.is_copied(id(1, 2)));
        assert!(!clip.is_copied(id(1, 3)));
    }

    #[test]
    fn test_capture_empty_selection_keeps_buffer() {
        let (tracker, grid) = setup();
        let mut clip = Clipboard::new();
        clip.capture(&grid, &select(&grid, &[id(1, 2)]), &tracker);
        assert_eq!(clip.capture(&grid, &Selection::new(), &tracker), 0);
        assert_eq!(clip.entries().len(), 1);
    }

    #[test]
    fn test_computed_cells_are_copy_sources() {
        let (tracker, grid) = setup();
        let mut clip = Clipboard::new();
        // monthly total of Clicks
        clip.capture(&grid, &select(&grid, &[id(32, 2)]), &tracker);
        assert_eq!(clip.entries()[0].value, 6.0);
    }

    #[test]
    fn test_broadcast() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        clip.capture(&grid, &select(&grid, &[id(2, 2)]), &tracker);

        let targets: Vec<CellId> = (5..10).map(|r| id(r, 3)).collect();
        let sel = select(&grid, &targets);
        assert_eq!(clip.shape(sel.len()), Some(PasteShape::Broadcast));
        assert_eq!(clip.replay(&mut grid, &sel, &mut tracker), 5);

        for day in 5..10 {
            assert_eq!(tracker.read(&format!("Leads_{}", day)), Some(2.0));
        }
        assert_eq!(grid.cell(id(5, 3)).unwrap().text, "2");
    }

    #[test]
    fn test_sequential_from_anchor() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        clip.capture(&grid, &select(&grid, &[id(1, 2), id(2, 2), id(3, 2)]), &tracker);

        // Leads_10, then the next input cells: Clicks_11, Leads_11
        let sel = select(&grid, &[id(10, 3)]);
        assert_eq!(clip.shape(1), Some(PasteShape::Sequential));
        assert_eq!(clip.replay(&mut grid, &sel, &mut tracker), 3);

        assert_eq!(tracker.read("Leads_10"), Some(1.0));
        assert_eq!(tracker.read("Clicks_11"), Some(2.0));
        assert_eq!(tracker.read("Leads_11"), Some(3.0));
    }

    #[test]
    fn test_sequential_stops_at_grid_end() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        clip.capture(&grid, &select(&grid, &[id(1, 2), id(2, 2), id(3, 2)]), &tracker);

        let sel = select(&grid, &[id(30, 3)]);
        assert_eq!(clip.replay(&mut grid, &sel, &mut tracker), 1);
        assert_eq!(tracker.read("Leads_30"), Some(1.0));
    }

    #[test]
    fn test_zip() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        clip.capture(&grid, &select(&grid, &[id(1, 2), id(2, 2), id(3, 2)]), &tracker);

        let sel = select(&grid, &[id(20, 3), id(12, 3), id(15, 2)]);
        assert_eq!(clip.shape(3), Some(PasteShape::Zip));
        clip.replay(&mut grid, &sel, &mut tracker);

        assert_eq!(tracker.read("Leads_20"), Some(1.0));
        assert_eq!(tracker.read("Leads_12"), Some(2.0));
        assert_eq!(tracker.read("Clicks_15"), Some(3.0));
    }

    #[test]
    fn test_mismatched_sizes_are_noop() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        clip.capture(&grid, &select(&grid, &[id(1, 2), id(2, 2), id(3, 2)]), &tracker);

        let sel = select(&grid, &[id(10, 2), id(11, 2)]);
        assert_eq!(clip.shape(2), None);
        assert_eq!(clip.replay(&mut grid, &sel, &mut tracker), 0);
        assert_eq!(tracker.read("Clicks_10"), None);
        assert_eq!(clip.entries().len(), 3);
    }

    #[test]
    fn test_capture_then_replay_is_idempotent() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        let sel = select(&grid, &[id(1, 2), id(2, 2), id(3, 2)]);
        let before: Vec<String> = sel.cells().iter().map(|&c| grid.cell(c).unwrap().text.clone()).collect();

        clip.capture(&grid, &sel, &tracker);
        clip.replay(&mut grid, &sel, &mut tracker);

        let after: Vec<String> = sel.cells().iter().map(|&c| grid.cell(c).unwrap().text.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(tracker.read("Clicks_3"), Some(3.0));
    }

    #[test]
    fn test_paste_recalculates_and_clears_buffer() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        clip.capture(&grid, &select(&grid, &[id(3, 2)]), &tracker);
        let sel = select(&grid, &[id(4, 2)]);
        clip.replay(&mut grid, &sel, &mut tracker);

        // monthly total picked up the pasted value
        assert_eq!(grid.cell(id(32, 2)).unwrap().value, Some(9.0));
        assert!(clip.is_empty());
        assert!(!clip.is_copied(id(3, 2)));
    }

    #[test]
    fn test_buffer_kept_when_configured() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        clip.clear_after_paste = false;
        clip.capture(&grid, &select(&grid, &[id(3, 2)]), &tracker);
        let first = select(&grid, &[id(4, 2)]);
        clip.replay(&mut grid, &first, &mut tracker);
        let second = select(&grid, &[id(5, 2)]);
        clip.replay(&mut grid, &second, &mut tracker);
        assert_eq!(tracker.read("Clicks_5"), Some(3.0));
    }

    #[test]
    fn test_paste_onto_computed_cells_writes_nothing() {
        let (mut tracker, mut grid) = setup();
        let mut clip = Clipboard::new();
        clip.capture(&grid, &select(&grid, &[id(1, 2)]), &tracker);
        let sel = select(&grid, &[id(5, 4)]);
        assert_eq!(clip.replay(&mut grid, &sel, &mut tracker), 0);
        assert!(!clip.is_empty());
    }

    #[test]
    fn test_to_tsv() {
        let (_, grid) = setup();
        let sel = select(&grid, &[id(1, 2), id(2, 3), id(2, 2)]);
        assert_eq!(Clipboard::to_tsv(&grid, &sel).unwrap(), "1\t\n2\t");
        assert!(Clipboard::to_tsv(&grid, &Selection::new()).is_none());
    }
}
