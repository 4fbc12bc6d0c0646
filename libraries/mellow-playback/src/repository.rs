//! Typed persistence over the key-value store
//!
//! Collections own their in-memory state; the repository only mirrors
//! it to the store. Persistence failures are logged and swallowed so
//! a broken store degrades the session to memory-only instead of
//! breaking playback.

use mellow_core::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

pub(crate) struct Repository<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    /// Load the stored value; missing, unreadable or undecodable data
    /// all fall back to `T::default()`
    pub fn load(&self) -> T {
        match self.store.get(self.key) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(key = self.key, error = %e, "Discarding undecodable stored value");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to read stored value");
                T::default()
            }
        }
    }

    /// Mirror the in-memory value to the store
    pub fn save(&self, value: &T) {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to encode value for storage");
                return;
            }
        };
        if let Err(e) = self.store.set(self.key, encoded) {
            warn!(key = self.key, error = %e, "Failed to persist value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_core::MemoryStore;

    #[test]
    fn load_falls_back_to_default_on_undecodable_data() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("numbers", serde_json::json!("not an array"))
            .unwrap();

        let repo: Repository<Vec<u32>> = Repository::new(store, "numbers");
        assert_eq!(repo.load(), Vec::<u32>::new());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = Arc::new(MemoryStore::new());
        let repo: Repository<Vec<u32>> = Repository::new(store, "numbers");

        repo.save(&vec![1, 2, 3]);
        assert_eq!(repo.load(), vec![1, 2, 3]);
    }
}
