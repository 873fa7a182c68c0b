mod app;
mod clipboard;
mod config;
mod format;
mod funnel;
mod grid;
mod gridview;
mod input;
mod interaction;
mod kpi;
mod mode;
mod selection;
mod store;
mod style;
mod tracker;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use config::AppConfig;
use store::JsonStore;
use style::{Style, Theme};
use tracker::{Tracker, View};

#[derive(Clone, Copy, Debug)]
struct MonthArg {
    year: i32,
    /// 0-based
    month: u32,
}

/// Parse `YYYY-MM`
fn parse_month(s: &str) -> Result<MonthArg, String> {
    let (year, month) = s
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
    let year: i32 = year.parse().map_err(|_| format!("invalid year '{}'", year))?;
    let month: u32 = month.parse().map_err(|_| format!("invalid month '{}'", month))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month must be 1-12, got {}", month));
    }
    Ok(MonthArg { year, month: month - 1 })
}

#[derive(Parser, Debug)]
#[command(name = "funnelgrid", version, about = "Daily KPI tracker for marketing funnels")]
struct Args {
    /// Config file (default: ~/.config/funnelgrid/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Month data file, overrides `data_file` from the config
    #[arg(long)]
    data: Option<PathBuf>,
    /// Funnel id to open
    #[arg(short, long)]
    funnel: Option<String>,
    /// Month to open, as YYYY-MM
    #[arg(short, long, value_parser = parse_month)]
    month: Option<MonthArg>,
    /// Open the year overview
    #[arg(short, long, conflicts_with = "month")]
    year: Option<i32>,
    /// Built-in theme name or theme file
    #[arg(short, long)]
    theme: Option<String>,
    /// Log file (default: funnelgrid.log next to the config)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// View asked for on the command line, which beats the remembered one
    fn requested_view(&self) -> Option<View> {
        match (self.month, self.year) {
            (Some(m), _) => Some(View::Month { year: m.year, month: m.month }),
            (None, Some(year)) => Some(View::Year { year }),
            (None, None) => None,
        }
    }
}

/// Log to a file; the terminal belongs to the UI. `RUST_LOG` overrides the level.
fn init_logging(path: &Path) {
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {}: {}", path.display(), e);
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
}

/// Handle panics gracefully
fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        restore_terminal();

        if let Some(location) = info.location() {
            error!(file = location.file(), line = location.line(), "panic occured");
        } else {
            error!("panic occured");
        }

        if let Some(s) = info.payload().downcast_ref::<&str>() {
            error!(message = %s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            error!(message = %s);
        }

        default_hook(info);
    }));
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_dir);
    let log_path = args.log_file.clone().unwrap_or_else(|| base_dir.join("funnelgrid.log"));
    init_logging(&log_path);
    info!("funnelgrid started");

    install_panic_hook();

    let config = AppConfig::load(&config_path).map_err(|e| {
        error!(error = %e, "failed to load config");
        io::Error::new(io::ErrorKind::InvalidData, e)
    })?;

    let theme_name = args.theme.as_deref().unwrap_or(&config.theme);
    let theme = Theme::load(theme_name).unwrap_or_else(|e| {
        warn!(theme = theme_name, error = %e, "falling back to the dark theme");
        Theme::dark()
    });

    let data_path = args.data.clone().unwrap_or_else(|| config.data_path(&base_dir));
    let store = JsonStore::open(&data_path).map_err(|e| {
        error!(error = %e, "failed to open data file");
        io::Error::new(io::ErrorKind::Other, e)
    })?;
    info!(path = %store.path().display(), "data file opened");

    let mut tracker = Tracker::new(Box::new(store), config.funnel_configs(), View::current_month());
    match args.funnel.as_ref().or(config.active_funnel.as_ref()) {
        Some(id) if tracker.select_funnel(id) => {}
        Some(id) => {
            warn!(funnel = %id, "unknown funnel, using the first one");
            tracker.restore_view();
        }
        None => tracker.restore_view(),
    }
    if let Some(view) = args.requested_view() {
        tracker.show(view);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(tracker, Style::with_theme(theme), &config);
    let result = app.run(&mut terminal);

    restore_terminal();
    terminal.show_cursor()?;
    info!("funnelgrid stopped");

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        let m = parse_month("2025-04").unwrap();
        assert_eq!((m.year, m.month), (2025, 3));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("2025").is_err());
        assert!(parse_month("abcd-01").is_err());
    }

    #[test]
    fn test_requested_view() {
        let args = Args::parse_from(["funnelgrid", "--month", "2024-12"]);
        assert_eq!(args.requested_view(), Some(View::Month { year: 2024, month: 11 }));

        let args = Args::parse_from(["funnelgrid", "-y", "2023"]);
        assert_eq!(args.requested_view(), Some(View::Year { year: 2023 }));

        assert_eq!(Args::parse_from(["funnelgrid"]).requested_view(), None);

        assert!(Args::try_parse_from(["funnelgrid", "-m", "2024-01", "-y", "2023"]).is_err());
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
