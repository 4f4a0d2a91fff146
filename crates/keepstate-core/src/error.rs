//! Error types for the core crate.

use thiserror::Error;

/// Result type for adapter construction and key changes.
pub type StateResult<T> = Result<T, StateError>;

/// Errors surfaced to whoever constructs or re-keys an adapter.
///
/// Persistence failures after construction are never errors; they are
/// reported as [`crate::PersistenceWarning`]s.
#[derive(Debug, Error)]
pub enum StateError {
    /// An existing store entry could not be decoded during hydration.
    #[error("cannot decode stored value for {key:?}: {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// The adapter was set up with an unusable key or codec.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The store failed while reading the initial value.
    #[error("storage error: {0}")]
    Storage(#[from] keepstate_storage::StorageError),
}

impl StateError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error came from decoding a stored value.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Errors raised by a [`crate::Codec`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other codec-specific failure.
    #[error("{0}")]
    Custom(String),
}

impl CodecError {
    /// Create a custom codec error.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}
