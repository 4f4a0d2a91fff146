//! Persistent state over a slow or remote store.
//!
//! [`DeferredState`] behaves like [`crate::PersistentState`] but never waits
//! on the store after hydration. Each synchronization pass becomes a short
//! list of store operations handed to one background task, which applies
//! them strictly in order. Store failures come back as
//! [`PersistenceWarning`]s on the channel returned by
//! [`crate::PersistentStateBuilder::build_deferred`]; codec failures happen
//! before anything is queued and are returned from the write itself.

use crate::codec::SharedCodec;
use crate::error::StateResult;
use crate::hydrate::validate_key;
use crate::tracker::SyncTracker;
use crate::warning::{PersistOp, PersistenceWarning, SyncOutcome};
use keepstate_storage::AsyncStore;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

enum StoreOp {
    Remove(String),
    Set { key: String, raw: String },
    Flush(oneshot::Sender<()>),
}

/// A value kept in sync with an [`AsyncStore`] without blocking writers.
pub struct DeferredState<T, S> {
    key: String,
    value: T,
    codec: SharedCodec<T>,
    store: Arc<S>,
    tracker: SyncTracker<T>,
    ops: mpsc::UnboundedSender<StoreOp>,
    initial: SyncOutcome,
}

impl<T, S> DeferredState<T, S>
where
    T: Clone + PartialEq + 'static,
    S: AsyncStore + 'static,
{
    /// Spawn the store worker and queue the initial write.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn start(
        store: S,
        key: String,
        value: T,
        codec: SharedCodec<T>,
    ) -> (Self, mpsc::UnboundedReceiver<PersistenceWarning>) {
        let store = Arc::new(store);
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let (warn_tx, warn_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_worker(store.clone(), ops_rx, warn_tx));

        let mut state = Self {
            tracker: SyncTracker::new(&key),
            key,
            value,
            codec,
            store,
            ops: ops_tx,
            initial: SyncOutcome::Unchanged,
        };
        state.initial = state.sync();
        (state, warn_rx)
    }

    /// The current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// The key the value is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The codec handle in use.
    pub fn codec(&self) -> &SharedCodec<T> {
        &self.codec
    }

    /// The backing store, shared with the worker.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// What the write queued at construction did.
    ///
    /// Only a codec failure can show up here; store failures of the initial
    /// write arrive on the warning channel like any other.
    pub fn initial_outcome(&self) -> &SyncOutcome {
        &self.initial
    }

    /// Replace the value and queue its persistence.
    pub fn set(&mut self, value: T) -> SyncOutcome {
        self.value = value;
        self.sync()
    }

    /// Swap in a new value, returning the old one alongside the outcome.
    pub fn replace(&mut self, value: T) -> (T, SyncOutcome) {
        let old = std::mem::replace(&mut self.value, value);
        (old, self.sync())
    }

    /// Mutate the value in place and queue its persistence.
    pub fn update(&mut self, edit: impl FnOnce(&mut T)) -> SyncOutcome {
        edit(&mut self.value);
        self.sync()
    }

    /// Move the value to a new key; the old entry is removed first.
    pub fn set_key(&mut self, key: impl Into<String>) -> StateResult<SyncOutcome> {
        let key = key.into();
        validate_key(&key)?;
        self.key = key;
        Ok(self.sync())
    }

    /// Swap the codec; the value is rewritten in the new format.
    pub fn set_codec(&mut self, codec: SharedCodec<T>) -> SyncOutcome {
        self.codec = codec;
        self.sync()
    }

    /// Queue a write of the current value even if nothing changed.
    ///
    /// A failed write is already committed by the time its warning arrives,
    /// so setting the same value again would be skipped; this re-sends it.
    pub fn resync(&mut self) -> SyncOutcome {
        self.tracker.invalidate();
        self.sync()
    }

    /// Wait until every operation queued so far has reached the store.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.ops.send(StoreOp::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Consume the adapter and return the value.
    ///
    /// Operations already queued are still applied by the worker.
    pub fn into_inner(self) -> T {
        self.value
    }

    fn sync(&mut self) -> SyncOutcome {
        let Some(plan) = self.tracker.plan(&self.key, &self.codec, &self.value) else {
            return SyncOutcome::Unchanged;
        };

        if let Some(stale_key) = plan.stale_key {
            self.enqueue(StoreOp::Remove(stale_key));
        }

        self.tracker.commit(&self.key, &self.codec, &self.value);

        match self.codec.serialize(&self.value) {
            Ok(raw) => {
                self.enqueue(StoreOp::Set {
                    key: self.key.clone(),
                    raw,
                });
                SyncOutcome::Queued
            }
            Err(e) => {
                let warning = PersistenceWarning::new(&self.key, PersistOp::Serialize, e);
                warning.log();
                SyncOutcome::Degraded(vec![warning])
            }
        }
    }

    fn enqueue(&self, op: StoreOp) {
        if self.ops.send(op).is_err() {
            debug!(key = %self.key, "Store worker has stopped, dropping operation");
        }
    }
}

impl<T: fmt::Debug, S> fmt::Debug for DeferredState<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredState")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// Apply queued operations one at a time until the adapter is dropped.
async fn run_worker<S: AsyncStore>(
    store: Arc<S>,
    mut ops: mpsc::UnboundedReceiver<StoreOp>,
    warnings: mpsc::UnboundedSender<PersistenceWarning>,
) {
    let report = |warning: PersistenceWarning| {
        warning.log();
        // Nobody listening is fine; the warning was logged
        let _ = warnings.send(warning);
    };

    while let Some(op) = ops.recv().await {
        match op {
            StoreOp::Remove(key) => match store.remove(&key).await {
                Ok(true) => debug!(key = %key, "Removed entry under previous key"),
                Ok(false) => debug!(key = %key, "No entry under previous key"),
                Err(e) => report(PersistenceWarning::new(key, PersistOp::Remove, e)),
            },
            StoreOp::Set { key, raw } => {
                if let Err(e) = store.set(&key, &raw).await {
                    report(PersistenceWarning::new(key, PersistOp::Set, e));
                }
            }
            StoreOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Store worker finished");
}
