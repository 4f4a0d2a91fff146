//! Single-document file storage.
//!
//! All entries live in one JSON object, `{"key": "raw value", ...}`. The
//! document is loaded once when the store is opened and rewritten
//! atomically (temp file, then rename) on every mutation, so a crash never
//! leaves a half-written store behind.

use crate::{StorageError, StorageResult, Store};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Durable store backed by a single JSON file.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file is an empty store; the file is only created on the
    /// first write. A file that exists but isn't a JSON object of strings
    /// is an error.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        debug!(path = %path.display(), "Opening file store");

        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(entries.keys().cloned().collect())
    }

    /// Write the whole document to disk.
    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(path = %self.path.display(), key, "Writing to file store");

        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        // Only commit in memory once the file agrees
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;

        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        if !entries.contains_key(key) {
            return Ok(false);
        }

        debug!(path = %self.path.display(), key, "Removing from file store");
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;

        Ok(true)
    }
}
