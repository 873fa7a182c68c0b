use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Field key (`{Column}_{day}`) to value, for one funnel and month
pub type MonthData = BTreeMap<String, f64>;

/// Identifies the stored data of one funnel month
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MonthKey {
    pub funnel: String,
    pub year: i32,
    /// 0-based
    pub month: u32,
}

impl MonthKey {
    pub fn new(funnel: impl Into<String>, year: i32, month: u32) -> Self {
        Self { funnel: funnel.into(), year, month }
    }

    /// e.g. `vsl_fb-ads_2025_03` for April 2025
    pub fn storage_key(&self) -> String {
        format!("vsl_{}_{}_{:02}", self.funnel, self.year, self.month + 1)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed data file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value contract for stored entries. Month data lives under
/// [`MonthKey::storage_key`]; other bookkeeping uses its own keys.
pub trait ValueStore {
    /// Stored entry; empty when nothing was saved yet
    fn get_entry(&self, storage_key: &str) -> MonthData;

    /// Replace an entry. Empty data removes it.
    fn set_entry(&mut self, storage_key: &str, data: MonthData) -> Result<(), StoreError>;

    fn get(&self, key: &MonthKey) -> MonthData {
        self.get_entry(&key.storage_key())
    }

    fn set(&mut self, key: &MonthKey, data: MonthData) -> Result<(), StoreError> {
        self.set_entry(&key.storage_key(), data)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    months: HashMap<String, MonthData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ValueStore for MemoryStore {
    fn get_entry(&self, storage_key: &str) -> MonthData {
        self.months.get(storage_key).cloned().unwrap_or_default()
    }

    fn set_entry(&mut self, storage_key: &str, data: MonthData) -> Result<(), StoreError> {
        if data.is_empty() {
            self.months.remove(storage_key);
        } else {
            self.months.insert(storage_key.to_string(), data);
        }
        Ok(())
    }
}

/// All entries in one JSON object keyed by storage key, rewritten on every set
pub struct JsonStore {
    path: PathBuf,
    months: BTreeMap<String, MonthData>,
}

impl JsonStore {
    /// Open the store, starting empty when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            info!(path = %path.display(), "data file not found, starting empty");
            return Ok(Self { path, months: BTreeMap::new() });
        }

        let file = File::open(&path).map_err(|source| StoreError::Io { path: path.clone(), source })?;
        let months: BTreeMap<String, MonthData> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        debug!(path = %path.display(), months = months.len(), "loaded data file");

        Ok(Self { path, months })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write to a sibling temp file, then rename over the data file
    fn save(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let file = File::create(&tmp).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.months)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl ValueStore for JsonStore {
    fn get_entry(&self, storage_key: &str) -> MonthData {
        self.months.get(storage_key).cloned().unwrap_or_default()
    }

    fn set_entry(&mut self, storage_key: &str, data: MonthData) -> Result<(), StoreError> {
        let storage_key = storage_key.to_string();
        let dropped: usize = data.values().filter(|v| !v.is_finite()).count();
        if dropped > 0 {
            warn!(key = %storage_key, dropped, "non-finite values not stored");
        }
        let data: MonthData = data.into_iter().filter(|(_, v)| v.is_finite()).collect();

        if data.is_empty() {
            self.months.remove(&storage_key);
        } else {
            self.months.insert(storage_key, data);
        }
        self.save()
    }
}
