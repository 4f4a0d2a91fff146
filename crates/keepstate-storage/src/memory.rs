//! In-memory storage implementation.

use crate::{AsyncStore, StorageError, StorageResult, Store};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory storage.
///
/// This stores all data in memory and is not persistent. It is what tests
/// use, and it can be frozen with [`MemoryStore::read_only`] to simulate a
/// store that rejects writes.
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    read_only: bool,
}

impl MemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            read_only: false,
        }
    }

    /// Create a store pre-populated with the given raw entries.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: RwLock::new(data),
            read_only: false,
        }
    }

    /// Make every `set`/`remove` fail with [`StorageError::ReadOnly`].
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .data
            .read()
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.read_only {
            Err(StorageError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        debug!(key, "Writing to memory store");

        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        self.check_writable()?;
        debug!(key, "Removing from memory store");

        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(data.remove(key).is_some())
    }
}

#[async_trait]
impl AsyncStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Store::get(self, key)
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        Store::set(self, key, value)
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        Store::remove(self, key)
    }
}
