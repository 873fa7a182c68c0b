use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::funnel::{default_funnels, FunnelConfig, FunnelDef};

/// Settings read from `config.toml`; every field is optional in the file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Built-in theme name or path to a theme file
    pub theme: String,
    /// Month data file; relative paths resolve against the config directory
    pub data_file: Option<PathBuf>,
    pub active_funnel: Option<String>,
    /// Drop the clipboard buffer after a successful paste
    pub clear_after_paste: bool,
    /// Also put copied selections on the system clipboard
    pub system_clipboard: bool,
    pub funnels: Vec<FunnelDef>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            data_file: None,
            active_funnel: None,
            clear_after_paste: true,
            system_clipboard: false,
            funnels: default_funnels(),
        }
    }
}

impl AppConfig {
    /// `$XDG_CONFIG_HOME/funnelgrid` or `~/.config/funnelgrid`
    pub fn config_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
            return PathBuf::from(dir).join("funnelgrid");
        }
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("funnelgrid")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load the config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        Self::parse(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let mut config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        if config.funnels.is_empty() {
            warn!("config defines no funnels, using the defaults");
            config.funnels = default_funnels();
        }
        Ok(config)
    }

    /// Data file location, resolved against `base_dir` when relative
    pub fn data_path(&self, base_dir: &Path) -> PathBuf {
        match &self.data_file {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => base_dir.join(p),
            None => base_dir.join("data.json"),
        }
    }

    pub fn funnel_configs(&self) -> Vec<FunnelConfig> {
        self.funnels.iter().map(FunnelDef::config).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.funnels.len(), 2);
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::parse(
            r#"
            theme = "light"
            clear_after_paste = false

            [[funnels]]
            id = "organic"
            name = "Organic"
            modules = ["organic", "classic-vsl-organic"]

            [[funnels]]
            id = "calls"
            name = "Cold Calls"
            preset = "direct-call-booking-2call"
            "#,
        )
        .unwrap();

        assert_eq!(config.theme, "light");
        assert!(!config.clear_after_paste);
        assert!(!config.system_clipboard);

        let funnels = config.funnel_configs();
        assert_eq!(funnels[0].inputs, vec!["Clicks", "Leads", "Survey"]);
        assert!(funnels[1].is_input("SettingBooking"));
    }

    #[test]
    fn test_empty_funnel_list_falls_back() {
        let config = AppConfig::parse("funnels = []").unwrap();
        assert_eq!(config.funnels, default_funnels());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = [").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_data_path() {
        let mut config = AppConfig::default();
        let base = Path::new("/cfg");
        assert_eq!(config.data_path(base), PathBuf::from("/cfg/data.json"));
        config.data_file = Some(PathBuf::from("months.json"));
        assert_eq!(config.data_path(base), PathBuf::from("/cfg/months.json"));
        config.data_file = Some(PathBuf::from("/var/funnel.json"));
        assert_eq!(config.data_path(base), PathBuf::from("/var/funnel.json"));
    }
}
