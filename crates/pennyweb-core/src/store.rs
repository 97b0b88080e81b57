//! Durable string-keyed storage for ledger state
//!
//! - `MemoryStore`: process memory, optional byte quota
//! - `FileStore`: one JSON object file on disk

use pennyweb_config::{StorageBackend, StorageConfig};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::error::CoreResult;

/// Key holding the balance as decimal text
pub const KEY_BALANCE: &str = "balance";
/// Key holding total income as decimal text
pub const KEY_TOTAL_INCOME: &str = "totalIncome";
/// Key holding total expense as decimal text
pub const KEY_TOTAL_EXPENSE: &str = "totalExpense";
/// Key holding the JSON transaction array
pub const KEY_TRANSACTIONS: &str = "transactions";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Store file {path} is not a JSON object: {message}")]
    Malformed { path: String, message: String },

    #[error("Failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A string-keyed durable store in the shape of browser local storage
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;

    fn remove_item(&mut self, key: &str) -> StoreResult<()>;

    fn clear(&mut self) -> StoreResult<()>;

    /// Write several entries. Stops at the first failure, so earlier entries
    /// may already be written; stores that can do better override this.
    fn set_items(&mut self, items: &[(&str, String)]) -> StoreResult<()> {
        for (key, value) in items {
            self.set_item(key, value)?;
        }
        Ok(())
    }
}

/// Owned store handle held by the ledger
pub type StoreRef = Box<dyn KeyValueStore>;

/// Build the store selected in configuration
pub fn open_store(config: &StorageConfig) -> CoreResult<StoreRef> {
    match config.backend {
        StorageBackend::File => {
            log::info!("Using file store at {}", config.path.display());
            Ok(Box::new(FileStore::new(&config.path)))
        }
        StorageBackend::Memory => {
            log::info!("Using in-memory store (data is lost on exit)");
            let store = match config.quota_bytes {
                Some(quota) => MemoryStore::with_quota(quota),
                None => MemoryStore::new(),
            };
            Ok(Box::new(store))
        }
    }
}

// ==================== Memory Store ====================

#[derive(Debug, Default)]
struct MemoryData {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryData {
    fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

/// In-memory store. Clones share the same data, like several handles onto
/// one browser's storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        let store = Self::new();
        store.lock().quota = Some(quota);
        store
    }

    /// Change the quota; `None` removes the limit
    pub fn set_quota(&self, quota: Option<usize>) {
        self.lock().quota = quota;
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock().items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.lock();
        if let Some(quota) = data.quota {
            let replaced = data.items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = data.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        data.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        self.lock().items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.lock().items.clear();
        Ok(())
    }
}

// ==================== File Store ====================

/// Store persisted as a single JSON object file.
///
/// Reads go to disk every time; writes replace the whole file through a
/// temporary file and a rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> StoreResult<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Current contents, or an empty map when the file cannot be decoded
    fn read_map_for_write(&self) -> StoreResult<BTreeMap<String, String>> {
        match self.read_map() {
            Err(StoreError::Malformed { path, message }) => {
                log::warn!("Replacing unreadable store file {}: {}", path, message);
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let encoded = serde_json::to_string_pretty(map)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let mut map = self.read_map_for_write()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        let mut map = self.read_map_for_write()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.write_map(&BTreeMap::new())
    }

    fn set_items(&mut self, items: &[(&str, String)]) -> StoreResult<()> {
        let mut map = self.read_map_for_write()?;
        for (key, value) in items {
            map.insert(key.to_string(), value.clone());
        }
        self.write_map(&map)
    }
}
