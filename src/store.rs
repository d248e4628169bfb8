//! Persisted keyed state store
//!
//! A small JSON object on disk holding values that must survive restarts
//! (selected database, last discovered database list). Every `set` writes
//! through to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Key of the currently selected database name
pub const SELECTED_DATABASE_KEY: &str = "selected_database";
/// Key of the cached `Vec<DatabaseInfo>` from the last successful discovery
pub const CACHED_DATABASES_KEY: &str = "cached_databases";
/// Key of the UTC timestamp of the last successful discovery
pub const DATABASES_REFRESHED_AT_KEY: &str = "databases_refreshed_at";

/// Process-wide keyed store.
///
/// The mutex serializes readers and writers from any runtime thread.
#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
    values: Mutex<Map<String, Value>>,
}

impl StateStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store. A corrupt file is logged and
    /// treated as empty; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<Map<String, Value>>(&data) {
                Ok(values) => {
                    debug!("Loaded {} state entries from {}", values.len(), path.display());
                    values
                }
                Err(e) => {
                    warn!("Ignoring unreadable state file {}: {}", path.display(), e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read state file {}", path.display()))
            }
        };

        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    /// Store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(Map::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Decode the value under `key`; `None` if absent or of the wrong shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.lock().get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Ignoring state entry '{}': {}", key, e);
                None
            }
        }
    }

    /// Encode `value` under `key` and write the store to disk.
    ///
    /// The in-memory value changes only once the write succeeded.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_value(value)
            .with_context(|| format!("Failed to encode state entry '{}'", key))?;
        let mut values = self.values.lock();
        let mut next = values.clone();
        next.insert(key.to_string(), encoded);
        self.flush(&next)?;
        *values = next;
        Ok(())
    }

    /// Remove `key` and write the store to disk; same commit rule as `set`
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock();
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.flush(&next)?;
        *values = next;
        Ok(())
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let data = serde_json::to_string_pretty(values)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, data)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatabaseInfo;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::open(temp_dir.path().join("state.json")).unwrap();
        assert_eq!(store.get::<String>(SELECTED_DATABASE_KEY), None);
    }

    #[test]
    fn test_database_list_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("state.json");
        let databases = vec![
            DatabaseInfo::new("default", 120, 4 * 1024 * 1024),
            DatabaseInfo {
                name: "papers".to_string(),
                document_count: 0,
                size_bytes: 0,
                size_description: "empty".to_string(),
            },
        ];

        let store = StateStore::open(&path).unwrap();
        store.set(CACHED_DATABASES_KEY, &databases).unwrap();
        drop(store);

        let reopened = StateStore::open(&path).unwrap();
        let loaded: Vec<DatabaseInfo> = reopened.get(CACHED_DATABASES_KEY).unwrap();
        assert_eq!(loaded, databases);
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = StateStore::open(&path).unwrap();
        assert_eq!(store.get::<String>(SELECTED_DATABASE_KEY), None);
        store.set(SELECTED_DATABASE_KEY, "notes").unwrap();

        let reopened = StateStore::open(&path).unwrap();
        assert_eq!(
            reopened.get::<String>(SELECTED_DATABASE_KEY).as_deref(),
            Some("notes")
        );
    }

    #[test]
    fn test_wrong_shape_reads_as_none() {
        let store = StateStore::in_memory();
        store.set(CACHED_DATABASES_KEY, "not a list").unwrap();
        assert_eq!(store.get::<Vec<DatabaseInfo>>(CACHED_DATABASES_KEY), None);
    }

    #[test]
    fn test_failed_write_leaves_value_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        let store = StateStore::open(&path).unwrap();
        store.set(SELECTED_DATABASE_KEY, "default").unwrap();

        // Occupy the temp file path so the next write fails
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();

        assert!(store.set(SELECTED_DATABASE_KEY, "papers").is_err());
        assert_eq!(
            store.get::<String>(SELECTED_DATABASE_KEY).as_deref(),
            Some("default")
        );
        assert!(store.remove(SELECTED_DATABASE_KEY).is_err());
        assert_eq!(
            store.get::<String>(SELECTED_DATABASE_KEY).as_deref(),
            Some("default")
        );

        let reopened = StateStore::open(&path).unwrap();
        assert_eq!(
            reopened.get::<String>(SELECTED_DATABASE_KEY).as_deref(),
            Some("default")
        );
    }

    #[test]
    fn test_remove() {
        let store = StateStore::in_memory();
        store.set(SELECTED_DATABASE_KEY, "x").unwrap();
        store.remove(SELECTED_DATABASE_KEY).unwrap();
        assert_eq!(store.get::<String>(SELECTED_DATABASE_KEY), None);
        assert!(store.path().is_none());
    }
}
