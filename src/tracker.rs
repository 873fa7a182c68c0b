use chrono::Datelike;
use tracing::{debug, error, info};

use crate::format::format_input;
use crate::funnel::FunnelConfig;
use crate::grid::layout::{month_grid, year_grid, MONTH_NAMES};
use crate::grid::Grid;
use crate::kpi;
use crate::store::{MonthData, MonthKey, ValueStore};

/// What the interaction core needs from its surroundings: field-level access
/// to the stored values behind the grid and a hook refreshing derived cells.
pub trait GridHost {
    fn read(&self, key: &str) -> Option<f64>;

    /// `None` removes the field
    fn write(&mut self, key: &str, value: Option<f64>);

    /// Several fields at once; stores that persist on write save once
    fn write_many(&mut self, updates: &[(String, Option<f64>)]) {
        for (key, value) in updates {
            self.write(key, *value);
        }
    }

    fn recalculate(&mut self, grid: &mut Grid);

    fn format(&self, value: f64, key: &str) -> String {
        format_input(value, key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// `month` is 0-based
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl View {
    pub fn current_month() -> Self {
        let today = chrono::Local::now().date_naive();
        View::Month { year: today.year(), month: today.month0() }
    }

    pub fn year(&self) -> i32 {
        match *self {
            View::Month { year, .. } | View::Year { year } => year,
        }
    }

    /// Bookkeeping entry: `y`, plus `m` for a month
    fn to_entry(self) -> MonthData {
        let mut data = MonthData::new();
        data.insert("y".to_string(), self.year() as f64);
        if let View::Month { month, .. } = self {
            data.insert("m".to_string(), month as f64);
        }
        data
    }

    fn from_entry(data: &MonthData) -> Option<Self> {
        let year = data.get("y").copied().filter(|y| y.fract() == 0.0 && y.abs() < 1e6)? as i32;
        match data.get("m") {
            None => Some(View::Year { year }),
            Some(&m) if m.fract() == 0.0 && (0.0..12.0).contains(&m) => {
                Some(View::Month { year, month: m as u32 })
            }
            Some(_) => None,
        }
    }

    pub fn display_name(&self) -> String {
        match *self {
            View::Month { year, month } => format!(
                "{} {}",
                MONTH_NAMES.get(month as usize).copied().unwrap_or("?"),
                year
            ),
            View::Year { year } => year.to_string(),
        }
    }
}

/// The funnel month (or year) on screen, backed by a value store
pub struct Tracker {
    store: Box<dyn ValueStore>,
    funnels: Vec<FunnelConfig>,
    active: usize,
    view: View,
    /// Month shown before switching to the year view
    last_month: u32,
    last_error: Option<String>,
}

impl Tracker {
    pub fn new(store: Box<dyn ValueStore>, funnels: Vec<FunnelConfig>, view: View) -> Self {
        let last_month = match view {
            View::Month { month, .. } => month,
            View::Year { .. } => 0,
        };
        Self { store, funnels, active: 0, view, last_month, last_error: None }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn funnel(&self) -> Option<&FunnelConfig> {
        self.funnels.get(self.active)
    }

    /// Activate the funnel with the given id and go back to the month or year
    /// it showed last. Unknown ids keep the current funnel.
    pub fn select_funnel(&mut self, id: &str) -> bool {
        match self.funnels.iter().position(|f| f.id == id) {
            Some(idx) => {
                self.active = idx;
                self.restore_view();
                true
            }
            None => false,
        }
    }

    pub fn cycle_funnel(&mut self) {
        if !self.funnels.is_empty() {
            self.active = (self.active + 1) % self.funnels.len();
            info!(funnel = %self.funnels[self.active].id, "switched funnel");
            self.restore_view();
        }
    }

    fn last_view_key(&self) -> Option<String> {
        self.funnel().map(|f| format!("vsl_last_active_{}", f.id))
    }

    /// Show the view remembered for the active funnel; without one the
    /// current view stays and becomes the funnel's remembered view
    pub fn restore_view(&mut self) {
        let Some(key) = self.last_view_key() else {
            return;
        };
        match View::from_entry(&self.store.get_entry(&key)) {
            Some(view) => {
                debug!(key = %key, view = %view.display_name(), "restored view");
                self.set_view(view);
            }
            None => self.remember_view(),
        }
    }

    /// Jump to a view and remember it for the active funnel
    pub fn show(&mut self, view: View) {
        self.set_view(view);
        self.remember_view();
    }

    fn set_view(&mut self, view: View) {
        self.view = view;
        if let View::Month { month, .. } = view {
            self.last_month = month;
        }
    }

    fn remember_view(&mut self) {
        let Some(key) = self.last_view_key() else {
            return;
        };
        if let Err(e) = self.store.set_entry(&key, self.view.to_entry()) {
            error!(error = %e, "failed to save last view");
            self.last_error = Some(e.to_string());
        }
    }

    /// Move one month (or one year in the year view) forward or back
    pub fn step(&mut self, forward: bool) {
        let view = match self.view {
            View::Month { year, month } => {
                let idx = year * 12 + month as i32 + if forward { 1 } else { -1 };
                View::Month { year: idx.div_euclid(12), month: idx.rem_euclid(12) as u32 }
            }
            View::Year { year } => View::Year { year: if forward { year + 1 } else { year - 1 } },
        };
        self.show(view);
    }

    pub fn toggle_view(&mut self) {
        let view = match self.view {
            View::Month { year, .. } => View::Year { year },
            View::Year { year } => View::Month { year, month: self.last_month },
        };
        self.show(view);
    }

    /// Delete every stored field of the month on screen. The year view has
    /// no single month to clear.
    pub fn clear_month(&mut self) -> bool {
        let Some(month) = self.month_key() else {
            return false;
        };
        info!(month = %month.storage_key(), "clearing month data");
        self.save_month(&month, MonthData::new());
        true
    }

    /// Take the last storage error, if any, for the status line
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    fn save_month(&mut self, month: &MonthKey, data: MonthData) {
        if let Err(e) = self.store.set(month, data) {
            error!(error = %e, "failed to save month data");
            self.last_error = Some(e.to_string());
        }
    }

    fn month_key(&self) -> Option<MonthKey> {
        let funnel = self.funnel()?;
        match self.view {
            View::Month { year, month } => Some(MonthKey::new(funnel.id.clone(), year, month)),
            View::Year { .. } => None,
        }
    }

    /// Build the grid for the current funnel and view, with every value filled in
    pub fn build_grid(&mut self) -> Grid {
        let Some(funnel) = self.funnel() else {
            return Grid::new("no funnel configured", Vec::new(), 0);
        };
        let mut grid = match self.view {
            View::Month { year, month } => month_grid(funnel, year, month),
            View::Year { year } => year_grid(funnel, year),
        };
        debug!(title = %grid.title, rows = grid.row_count(), "built grid");
        self.recalculate(&mut grid);
        grid
    }
}

impl GridHost for Tracker {
    fn read(&self, key: &str) -> Option<f64> {
        let month = self.month_key()?;
        self.store.get(&month).get(key).copied()
    }

    fn write(&mut self, key: &str, value: Option<f64>) {
        let Some(month) = self.month_key() else {
            return;
        };
        let mut data = self.store.get(&month);
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                data.insert(key.to_string(), v);
            }
            None => {
                data.remove(key);
            }
        }
        debug!(key, ?value, month = %month.storage_key(), "write field");
        self.save_month(&month, data);
    }

    fn write_many(&mut self, updates: &[(String, Option<f64>)]) {
        let Some(month) = self.month_key() else {
            return;
        };
        let mut data = self.store.get(&month);
        for (key, value) in updates {
            match value.filter(|v| v.is_finite()) {
                Some(v) => {
                    data.insert(key.clone(), v);
                }
                None => {
                    data.remove(key);
                }
            }
        }
        debug!(fields = updates.len(), month = %month.storage_key(), "write fields");
        self.save_month(&month, data);
    }

    fn recalculate(&mut self, grid: &mut Grid) {
        let Some(funnel) = self.funnel() else {
            return;
        };
        match self.view {
            View::Month { year, month } => {
                let data = self.store.get(&MonthKey::new(funnel.id.clone(), year, month));
                kpi::refresh_month(grid, funnel, &data, year, month);
            }
            View::Year { year } => {
                let months: Vec<MonthData> = (0..12)
                    .map(|m| self.store.get(&MonthKey::new(funnel.id.clone(), year, m)))
                    .collect();
                kpi::refresh_year(grid, funnel, &months, year);
            }
        }
    }
}
