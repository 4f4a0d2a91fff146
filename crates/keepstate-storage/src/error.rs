//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Why a store could not complete a read, write or removal.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document is not a JSON object of strings.
    #[error("store document is not valid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key {0:?} cannot be stored")]
    InvalidKey(String),

    #[error("store is read-only")]
    ReadOnly,

    /// The backend refused an otherwise valid request, e.g. over quota.
    #[error("{op} of {key:?} was refused: {reason}")]
    Rejected {
        op: &'static str,
        key: String,
        reason: String,
    },

    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    pub fn rejected(op: &'static str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            op,
            key: key.into(),
            reason: reason.into(),
        }
    }
}
