//! Local key-value store.
//!
//! Holds data that lives outside the document store (inventory and its stock
//! log). Values are kept in memory and, when a file is configured, written
//! through to a single JSON file on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::StoreError;

/// Key-value store persisted to one JSON file.
#[derive(Debug, Clone)]
pub struct LocalStore {
    values: Arc<DashMap<String, Value>>,
    path: Option<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    /// A store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            values: Arc::new(DashMap::new()),
            path: None,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Opens (or starts) the store at `path`.
    ///
    /// A missing file is an empty store. A file that is not a JSON object is
    /// an error, so nothing overwrites it by accident.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = DashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let parsed: BTreeMap<String, Value> = serde_json::from_slice(&bytes)?;
                for (key, value) in parsed {
                    values.insert(key, value);
                }
                debug!(path = %path.display(), keys = values.len(), "Local store loaded");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Local store file not found, starting empty");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            values: Arc::new(values),
            path: Some(path),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|v| v.value().clone())
    }

    /// Typed value for `key`, or the default when absent.
    ///
    /// A value that is present but does not decode is an error, never a
    /// default, so callers cannot overwrite data they failed to read.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, serde_json::Error> {
        match self.get(key) {
            Some(value) => serde_json::from_value(value),
            None => Ok(T::default()),
        }
    }

    /// Stores one value.
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.set_many(vec![(key.to_string(), serde_json::to_value(value)?)])
            .await
    }

    /// Stores several values with a single file write.
    pub async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        for (key, value) in entries {
            self.values.insert(key, value);
        }
        self.persist().await
    }

    /// Removes a key.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.values.remove(key);
        self.persist().await
    }

    /// Every key and value, sorted by key.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Replaces every value.
    pub async fn replace_all(&self, values: BTreeMap<String, Value>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.values.clear();
        for (key, value) in values {
            self.values.insert(key, value);
        }
        self.persist().await
    }

    /// Writes to a sibling temp file, then renames over the target.
    async fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(&self.snapshot())?;
        let tmp = path.with_extension("json.tmp");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}
