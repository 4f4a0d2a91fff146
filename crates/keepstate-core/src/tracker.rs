//! Dependency tracking for the synchronization routine.
//!
//! A pass is due only when `(key, codec handle, value)` differs from the
//! tuple observed by the previous pass. The tracker also remembers the key
//! the last pass wrote under, so a key change can clean up after itself.

use crate::codec::{same_codec, SharedCodec};

struct Observed<T> {
    key: String,
    codec: SharedCodec<T>,
    value: T,
}

/// What a due synchronization pass has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyncPlan {
    /// Entry to remove first because the key moved away from it.
    pub stale_key: Option<String>,
}

pub(crate) struct SyncTracker<T> {
    previous_key: String,
    observed: Option<Observed<T>>,
}

impl<T: Clone + PartialEq> SyncTracker<T> {
    /// Start tracking; the first pass is always due.
    pub fn new(key: &str) -> Self {
        Self {
            previous_key: key.to_string(),
            observed: None,
        }
    }

    /// Decide whether a pass is due for the current dependencies.
    pub fn plan(&self, key: &str, codec: &SharedCodec<T>, value: &T) -> Option<SyncPlan> {
        if let Some(observed) = &self.observed {
            if observed.key == key && same_codec(&observed.codec, codec) && observed.value == *value
            {
                return None;
            }
        }

        let stale_key = (self.previous_key != key).then(|| self.previous_key.clone());
        Some(SyncPlan { stale_key })
    }

    /// Record the dependencies a pass ran with.
    pub fn commit(&mut self, key: &str, codec: &SharedCodec<T>, value: &T) {
        self.previous_key = key.to_string();
        self.observed = Some(Observed {
            key: key.to_string(),
            codec: codec.clone(),
            value: value.clone(),
        });
    }

    /// Forget the observed tuple so the next pass runs unconditionally.
    pub fn invalidate(&mut self) {
        self.observed = None;
    }
}
