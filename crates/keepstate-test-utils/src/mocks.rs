//! Mock implementations for testing.
//!
//! Provides store doubles so adapter behaviour can be checked operation by
//! operation.

use async_trait::async_trait;
use keepstate_storage::{AsyncStore, StorageError, StorageResult, Store};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A store operation as seen by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Set(String, String),
    Remove(String),
}

/// An in-memory store that records every call it receives.
///
/// Writes and removals can be made to fail independently, which is how
/// tests simulate a full or locked-down store. Failed calls are still
/// recorded.
#[derive(Debug, Default)]
pub struct RecordingStore {
    data: Mutex<BTreeMap<String, String>>,
    calls: Mutex<Vec<StoreCall>>,
    fail_sets: AtomicBool,
    fail_removes: AtomicBool,
}

impl RecordingStore {
    /// Create an empty recording store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recording store with pre-existing entries.
    ///
    /// Seeding is not recorded as calls.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        store.data.lock().unwrap().extend(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into())),
        );
        store
    }

    /// Make every subsequent `set` fail (or succeed again).
    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `remove` fail (or succeed again).
    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget the recorded calls; stored data is kept.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Peek at an entry without recording a call.
    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.data.lock().unwrap().keys().cloned().collect()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Store for RecordingStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.record(StoreCall::Get(key.to_string()));
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.record(StoreCall::Set(key.to_string(), value.to_string()));
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(StorageError::rejected("set", key, "quota exceeded"));
        }
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        self.record(StoreCall::Remove(key.to_string()));
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StorageError::rejected("remove", key, "permission denied"));
        }
        Ok(self.data.lock().unwrap().remove(key).is_some())
    }
}

#[async_trait]
impl AsyncStore for RecordingStore {
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
