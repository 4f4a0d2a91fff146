//! Non-fatal persistence problems.
//!
//! Once an adapter exists its in-memory value is the source of truth; a
//! store that refuses a write only produces a [`PersistenceWarning`].

use crate::error::CodecError;
use keepstate_storage::StorageError;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// The persistence step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOp {
    /// Encoding the value with the codec.
    Serialize,
    /// Writing the entry for the current key.
    Set,
    /// Removing the entry left under a previous key.
    Remove,
}

impl fmt::Display for PersistOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PersistOp::Serialize => "serialize",
            PersistOp::Set => "set",
            PersistOp::Remove => "remove",
        })
    }
}

/// Why a persistence step failed.
#[derive(Debug, Error)]
pub enum WarningCause {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A failed, best-effort persistence step.
#[derive(Debug, Error)]
#[error("failed to {op} {key:?}: {cause}")]
pub struct PersistenceWarning {
    pub key: String,
    pub op: PersistOp,
    #[source]
    pub cause: WarningCause,
}

impl PersistenceWarning {
    pub fn new(key: impl Into<String>, op: PersistOp, cause: impl Into<WarningCause>) -> Self {
        Self {
            key: key.into(),
            op,
            cause: cause.into(),
        }
    }

    /// Emit the warning through tracing.
    pub(crate) fn log(&self) {
        warn!(key = %self.key, op = %self.op, error = %self.cause, "Persistence step failed");
    }
}

/// What a synchronization pass did.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Key, codec and value were unchanged; the store was not touched.
    Unchanged,
    /// The store now reflects the current value.
    Persisted,
    /// Store operations were handed to a background worker.
    Queued,
    /// The value is current in memory but some store steps failed.
    Degraded(Vec<PersistenceWarning>),
}

impl SyncOutcome {
    /// True unless a persistence step failed.
    pub fn is_clean(&self) -> bool {
        !matches!(self, SyncOutcome::Degraded(_))
    }

    /// Warnings produced by this pass, if any.
    pub fn warnings(&self) -> &[PersistenceWarning] {
        match self {
            SyncOutcome::Degraded(warnings) => warnings,
            _ => &[],
        }
    }
}
