//! Key-value storage for persisted collections
//!
//! Models the browser-local-storage contract the collections are built
//! on: string key to JSON value, synchronized on every write, a read of
//! a missing key yields the caller-supplied default. Implementations
//! must never lose the in-memory value on a persistence failure; the
//! caller treats memory as authoritative for the rest of the session.

use crate::error::{CoreError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persistent mapping from string key to JSON value
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, persisting immediately
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove the value stored under `key`, if any
    fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile in-memory store
///
/// Backs unit tests and sessions that opt out of persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let map = self
            .map
            .lock()
            .map_err(|_| CoreError::storage("store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| CoreError::storage("store lock poisoned"))?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| CoreError::storage("store lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON document on disk
///
/// The whole document is rewritten on every mutation, mirroring the
/// write-through behavior of browser local storage. The in-memory map
/// stays valid even when the disk write fails.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    map: Mutex<HashMap<String, Value>>,
}

impl JsonFileStore {
    /// Open (or create) a store at `path`
    ///
    /// An unreadable or corrupt document is treated as empty rather
    /// than refusing to start; the previous content is overwritten on
    /// the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let map = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt store document");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    fn flush(&self, map: &HashMap<String, Value>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(map)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let map = self
            .map
            .lock()
            .map_err(|_| CoreError::storage("store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| CoreError::storage("store lock poisoned"))?;
        map.insert(key.to_string(), value);
        self.flush(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| CoreError::storage("store lock poisoned"))?;
        map.remove(key);
        self.flush(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("key", json!({"a": 1})).unwrap();
        assert_eq!(store.get("key").unwrap(), Some(json!({"a": 1})));

        store.remove("key").unwrap();
        assert_eq!(store.get("key").unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mellow.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("favorites", json!([{"name": "A"}])).unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("favorites").unwrap(),
            Some(json!([{"name": "A"}]))
        );
    }

    #[test]
    fn file_store_survives_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mellow.json");
        fs::write(&path, b"{not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);

        store.set("key", json!(1)).unwrap();
        assert_eq!(store.get("key").unwrap(), Some(json!(1)));
    }
}
