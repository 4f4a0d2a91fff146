//! Directory-based storage implementation.
//!
//! This backend stores each key as a separate file holding the raw value.
//! Keys map to file paths: `"name"` -> `<base>/name.entry`. It is async
//! (tokio fs) and is meant for hosts that treat persistence as slow I/O.

use crate::{AsyncStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

const ENTRY_EXTENSION: &str = "entry";

/// One-file-per-key storage.
#[derive(Clone)]
pub struct DirStore {
    base_path: PathBuf,
}

impl DirStore {
    /// Create a new directory store at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the file path for a key.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        // No path traversal, no nesting
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key == "."
            || key == ".."
        {
            return Err(StorageError::invalid_key(key));
        }

        Ok(self.base_path.join(format!("{key}.{ENTRY_EXTENSION}")))
    }
}

#[async_trait]
impl AsyncStore for DirStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Reading from storage");

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Writing to storage");

        fs::create_dir_all(&self.base_path).await?;

        // Write atomically (write to temp file, then rename)
        let mut temp_path = path.clone().into_os_string();
        temp_path.push(".tmp");
        fs::write(&temp_path, value).await?;
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Removing from storage");

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
