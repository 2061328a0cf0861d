//! Storage Port
//!
//! The ledger persists its whole [`EventState`](crate::EventState) as one blob
//! under a fixed key. Anything that can `load`/`save` a string by key works:
//! - [`MemoryStore`] for tests and throwaway sessions
//! - [`JsonFileStore`] for a `<key>.json` file per key that survives restarts

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Default key the event blob is stored under
pub const DEFAULT_STORAGE_KEY: &str = "doorprize-storage";

/// Key-value blob store, last write wins
pub trait StateStore: Send + Sync {
    /// Load the blob stored under `key`, `None` if absent
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`
    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;

    /// Move an unreadable blob out of the way so the next `save` cannot
    /// overwrite it. A no-op when nothing is stored under `key`.
    fn quarantine(&self, key: &str) -> Result<(), StorageError>;
}

/// Key an unreadable blob is kept under
pub fn quarantine_key(key: &str) -> String {
    format!("{key}.corrupt")
}

// ============ Storage Config ============

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the blob files
    pub dir: PathBuf,
    /// Key the event blob is stored under
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("doorprize")
}

// ============ Memory Store ============

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.blobs.write().insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn quarantine(&self, key: &str) -> Result<(), StorageError> {
        let mut blobs = self.blobs.write();
        if let Some(blob) = blobs.remove(key) {
            blobs.insert(quarantine_key(key), blob);
        }
        Ok(())
    }
}

// ============ JSON File Store ============

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        // Write beside the target then rename so a crash never leaves half a blob
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;

        log::debug!("[Storage] Saved {} bytes to {:?}", blob.len(), path);
        Ok(())
    }

    fn quarantine(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }

        let aside = path.with_extension("json.corrupt");
        fs::rename(&path, &aside)?;
        log::warn!("[Storage] Moved unreadable {:?} to {:?}", path, aside);
        Ok(())
    }
}
