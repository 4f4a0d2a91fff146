//! Hydration: turning whatever the store holds into the adapter's first value.

use crate::codec::SharedCodec;
use crate::default_value::DefaultValue;
use crate::error::{StateError, StateResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do when the stored entry exists but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrationPolicy {
    /// Return [`StateError::Decode`] to the caller.
    #[default]
    Strict,
    /// Log a warning and start from the default value.
    #[serde(rename = "fallback")]
    FallbackToDefault,
}

/// Reject the empty key; any other string names a store entry.
pub(crate) fn validate_key(key: &str) -> StateResult<()> {
    if key.is_empty() {
        return Err(StateError::configuration("key must not be empty"));
    }
    Ok(())
}

/// Compute the initial value from the raw store entry.
///
/// An empty entry counts as absent. The default is only resolved when it
/// is actually used.
pub(crate) fn hydrate<T>(
    key: &str,
    raw: Option<String>,
    default: DefaultValue<T>,
    codec: &SharedCodec<T>,
    policy: HydrationPolicy,
) -> StateResult<T> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            debug!(key, "No stored value, using default");
            return Ok(default.resolve());
        }
    };

    match codec.deserialize(&raw) {
        Ok(value) => {
            debug!(key, "Hydrated from store");
            Ok(value)
        }
        Err(source) => match policy {
            HydrationPolicy::Strict => Err(StateError::Decode {
                key: key.to_string(),
                source,
            }),
            HydrationPolicy::FallbackToDefault => {
                warn!(key, error = %source, "Stored value is unreadable, falling back to default");
                Ok(default.resolve())
            }
        },
    }
}
