//! The synchronous persistent state adapter.
//!
//! # Example
//!
//! ```
//! use keepstate_core::PersistentState;
//! use keepstate_storage::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let mut name = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();
//! assert_eq!(name.get(), "Kara");
//!
//! name.set("Ada".to_string());
//! assert_eq!(store.get("name").unwrap().as_deref(), Some("\"Ada\""));
//! ```

use crate::codec::{JsonCodec, SharedCodec};
use crate::default_value::DefaultValue;
use crate::deferred::DeferredState;
use crate::error::{StateError, StateResult};
use crate::hydrate::{hydrate, validate_key, HydrationPolicy};
use crate::tracker::SyncTracker;
use crate::warning::{PersistOp, PersistenceWarning, SyncOutcome};
use crate::Codec;
use keepstate_storage::{AsyncStore, Store};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// A value of type `T` kept in sync with the entry `key` of a [`Store`].
///
/// The value is loaded once, at construction. Every later change to the
/// value, the key, or the codec writes the value back; a key change first
/// removes the entry under the old key so only one entry ever exists.
pub struct PersistentState<T, S> {
    key: String,
    value: T,
    codec: SharedCodec<T>,
    store: S,
    tracker: SyncTracker<T>,
    initial: SyncOutcome,
}

impl<T, S> PersistentState<T, S>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
    S: Store,
{
    /// Hydrate from `store` with the JSON codec and strict decoding.
    pub fn new(store: S, key: impl Into<String>, default: T) -> StateResult<Self> {
        PersistentState::<T, ()>::builder(key, default).build(store)
    }

    /// Like [`PersistentState::new`], computing the default only if the
    /// store has nothing for `key`.
    pub fn with_factory(
        store: S,
        key: impl Into<String>,
        factory: impl FnOnce() -> T + 'static,
    ) -> StateResult<Self> {
        PersistentState::<T, ()>::builder_with_factory(key, factory).build(store)
    }
}

impl<T> PersistentState<T, ()>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
{
    /// Start configuring an adapter that uses the JSON codec unless told otherwise.
    pub fn builder(key: impl Into<String>, default: T) -> PersistentStateBuilder<T> {
        PersistentStateBuilder::new(key, DefaultValue::literal(default)).codec(JsonCodec)
    }

    /// [`PersistentState::builder`] with a lazily computed default.
    pub fn builder_with_factory(
        key: impl Into<String>,
        factory: impl FnOnce() -> T + 'static,
    ) -> PersistentStateBuilder<T> {
        PersistentStateBuilder::new(key, DefaultValue::factory(factory)).codec(JsonCodec)
    }
}

impl<T, S> PersistentState<T, S>
where
    T: Clone + PartialEq + 'static,
    S: Store,
{
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

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// What the write made at construction did.
    ///
    /// Hydration itself never fails on a refused write, so this is where a
    /// read-only or full store first shows up.
    pub fn initial_outcome(&self) -> &SyncOutcome {
        &self.initial
    }

    /// Replace the value and persist it.
    pub fn set(&mut self, value: T) -> SyncOutcome {
        self.value = value;
        self.sync()
    }

    /// Swap in a new value, returning the old one alongside the outcome.
    pub fn replace(&mut self, value: T) -> (T, SyncOutcome) {
        let old = std::mem::replace(&mut self.value, value);
        (old, self.sync())
    }

    /// Mutate the value in place and persist the result.
    pub fn update(&mut self, edit: impl FnOnce(&mut T)) -> SyncOutcome {
        edit(&mut self.value);
        self.sync()
    }

    /// Move the value to a new key, removing the entry under the old one.
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

    /// Persist the current value even if nothing changed since the last pass.
    ///
    /// Useful after a [`SyncOutcome::Degraded`] write once the store has
    /// recovered.
    pub fn resync(&mut self) -> SyncOutcome {
        self.tracker.invalidate();
        self.sync()
    }

    /// Consume the adapter and return the value. The stored entry stays.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Run the synchronization routine if any dependency changed.
    ///
    /// Removal of a stale entry always happens before the new write.
    fn sync(&mut self) -> SyncOutcome {
        let Some(plan) = self.tracker.plan(&self.key, &self.codec, &self.value) else {
            return SyncOutcome::Unchanged;
        };

        let mut warnings = Vec::new();

        if let Some(stale_key) = plan.stale_key {
            match self.store.remove(&stale_key) {
                Ok(true) => debug!(from = %stale_key, to = %self.key, "Removed entry under previous key"),
                Ok(false) => debug!(key = %stale_key, "No entry under previous key"),
                Err(e) => warnings.push(PersistenceWarning::new(stale_key, PersistOp::Remove, e)),
            }
        }

        self.tracker.commit(&self.key, &self.codec, &self.value);

        match self.codec.serialize(&self.value) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&self.key, &raw) {
                    warnings.push(PersistenceWarning::new(&self.key, PersistOp::Set, e));
                }
            }
            Err(e) => warnings.push(PersistenceWarning::new(&self.key, PersistOp::Serialize, e)),
        }

        if warnings.is_empty() {
            SyncOutcome::Persisted
        } else {
            warnings.iter().for_each(PersistenceWarning::log);
            SyncOutcome::Degraded(warnings)
        }
    }
}

impl<T: fmt::Debug, S> fmt::Debug for PersistentState<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentState")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// Configures and hydrates a [`PersistentState`] or [`DeferredState`].
pub struct PersistentStateBuilder<T> {
    key: String,
    default: DefaultValue<T>,
    codec: Option<SharedCodec<T>>,
    policy: HydrationPolicy,
}

impl<T> PersistentStateBuilder<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Start a builder with no codec; one must be supplied before building.
    pub fn new(key: impl Into<String>, default: DefaultValue<T>) -> Self {
        Self {
            key: key.into(),
            default,
            codec: None,
            policy: HydrationPolicy::default(),
        }
    }

    /// Use `codec` for the stored representation.
    pub fn codec(self, codec: impl Codec<T> + 'static) -> Self {
        self.shared_codec(Arc::new(codec))
    }

    /// Use an existing codec handle.
    pub fn shared_codec(mut self, codec: SharedCodec<T>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Choose what happens when the stored entry cannot be decoded.
    pub fn policy(mut self, policy: HydrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn checked_codec(&mut self) -> StateResult<SharedCodec<T>> {
        validate_key(&self.key)?;
        self.codec
            .take()
            .ok_or_else(|| StateError::configuration("no codec configured"))
    }

    /// Hydrate from a synchronous store and write the initial value back.
    pub fn build<S: Store>(mut self, store: S) -> StateResult<PersistentState<T, S>> {
        let codec = self.checked_codec()?;
        let raw = store.get(&self.key)?;
        let value = hydrate(&self.key, raw, self.default, &codec, self.policy)?;

        let mut state = PersistentState {
            tracker: SyncTracker::new(&self.key),
            key: self.key,
            value,
            codec,
            store,
            initial: SyncOutcome::Unchanged,
        };
        state.initial = state.sync();
        Ok(state)
    }

    /// Hydrate from an asynchronous store; later writes never wait on it.
    ///
    /// Returns the adapter and the channel its persistence warnings arrive on.
    pub async fn build_deferred<S>(
        mut self,
        store: S,
    ) -> StateResult<(DeferredState<T, S>, mpsc::UnboundedReceiver<PersistenceWarning>)>
    where
        S: AsyncStore + 'static,
    {
        let codec = self.checked_codec()?;
        let raw = store.get(&self.key).await?;
        let value = hydrate(&self.key, raw, self.default, &codec, self.policy)?;
        Ok(DeferredState::start(store, self.key, value, codec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TextCodec;
    use crate::error::CodecError;
    use crate::FnCodec;
    use keepstate_storage::MemoryStore;
    use keepstate_test_utils::{RecordingStore, StoreCall};
    use std::cell::Cell;
    use std::rc::Rc;

    fn raw(store: &MemoryStore, key: &str) -> Option<String> {
        Store::get(store, key).unwrap()
    }

    #[test]
    fn test_default_used_and_persisted_on_empty_store() {
        let store = MemoryStore::new();
        let state = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();

        assert_eq!(state.get(), "Kara");
        assert_eq!(raw(&store, "name").as_deref(), Some("\"Kara\""));
    }

    #[test]
    fn test_write_persists_new_value() {
        let store = MemoryStore::new();
        let mut state = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();

        let outcome = state.set("Ada".to_string());
        assert!(matches!(outcome, SyncOutcome::Persisted));
        assert_eq!(state.get(), "Ada");
        assert_eq!(raw(&store, "name").as_deref(), Some("\"Ada\""));
    }

    #[test]
    fn test_store_wins_over_default() {
        let store = MemoryStore::with_entries([("name", "\"Ada\"")]);
        let state = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();
        assert_eq!(state.get(), "Ada");
    }

    #[test]
    fn test_factory_invoked_exactly_once() {
        let store = MemoryStore::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();

        let mut state = PersistentState::with_factory(&store, "count", move || {
            counter.set(counter.get() + 1);
            10u32
        })
        .unwrap();

        state.set(11);
        state.update(|n| *n += 1);
        state.set_key("counter").unwrap();

        assert_eq!(*state.get(), 12);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_factory_not_invoked_when_store_has_value() {
        let store = MemoryStore::with_entries([("count", "3")]);
        let state = PersistentState::with_factory(&store, "count", || -> u32 {
            panic!("default should not be computed")
        })
        .unwrap();
        assert_eq!(*state.get(), 3);

        let state = PersistentState::builder_with_factory("count", || 0u32)
            .build(&store)
            .unwrap();
        assert_eq!(*state.get(), 3);
    }

    #[test]
    fn test_malformed_entry_is_decode_error() {
        let store = MemoryStore::with_entries([("name", "not-json")]);
        let err = PersistentState::new(&store, "name", "Kara".to_string()).unwrap_err();

        assert!(err.is_decode());
        // Nothing was substituted or overwritten
        assert_eq!(raw(&store, "name").as_deref(), Some("not-json"));
    }

    #[test]
    fn test_malformed_entry_with_fallback_policy() {
        let store = MemoryStore::with_entries([("name", "not-json")]);
        let state = PersistentState::builder("name", "Kara".to_string())
            .policy(HydrationPolicy::FallbackToDefault)
            .build(&store)
            .unwrap();

        assert_eq!(state.get(), "Kara");
        assert_eq!(raw(&store, "name").as_deref(), Some("\"Kara\""));
    }

    #[test]
    fn test_empty_key_is_configuration_error() {
        let store = MemoryStore::new();
        let err = PersistentState::new(&store, "", 0u8).unwrap_err();
        assert!(matches!(err, StateError::Configuration(_)));

        let mut state = PersistentState::new(&store, "k", 0u8).unwrap();
        assert!(matches!(state.set_key(""), Err(StateError::Configuration(_))));
        assert_eq!(state.key(), "k");
    }

    #[test]
    fn test_whitespace_key_is_a_valid_key() {
        let store = MemoryStore::new();
        let mut state = PersistentState::new(&store, " ", "Kara".to_string()).unwrap();
        assert_eq!(raw(&store, " ").as_deref(), Some("\"Kara\""));

        state.set_key("\t").unwrap();
        assert_eq!(store.keys(), vec!["\t"]);
    }

    #[test]
    fn test_missing_codec_is_configuration_error() {
        // Not serde-capable, so there is no codec to fall back on
        #[derive(Debug, Clone, PartialEq)]
        struct Opaque(u8);

        let store = MemoryStore::new();
        let err = PersistentStateBuilder::new("k", DefaultValue::literal(Opaque(1)))
            .build(&store)
            .unwrap_err();
        assert!(matches!(err, StateError::Configuration(_)));
    }

    #[test]
    fn test_key_migration_moves_entry() {
        let store = MemoryStore::new();
        let mut state = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();
        state.set("Ada".to_string());

        let outcome = state.set_key("username").unwrap();
        assert!(outcome.is_clean());

        assert_eq!(raw(&store, "name"), None);
        assert_eq!(raw(&store, "username").as_deref(), Some("\"Ada\""));
        assert_eq!(store.keys(), vec!["username"]);
    }

    #[test]
    fn test_migration_removes_before_writing() {
        let store = RecordingStore::new();
        let mut state = PersistentState::new(&store, "k1", 5u32).unwrap();
        store.clear_calls();

        state.set_key("k2").unwrap();

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Remove("k1".to_string()),
                StoreCall::Set("k2".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_unchanged_value_skips_store() {
        let store = RecordingStore::new();
        let mut state = PersistentState::new(&store, "k", 5u32).unwrap();
        store.clear_calls();

        assert!(matches!(state.set(5), SyncOutcome::Unchanged));
        assert!(matches!(state.set_key("k").unwrap(), SyncOutcome::Unchanged));
        assert!(store.calls().is_empty());

        assert!(matches!(state.resync(), SyncOutcome::Persisted));
        assert_eq!(
            store.calls(),
            vec![StoreCall::Set("k".to_string(), "5".to_string())]
        );
    }

    #[test]
    fn test_hydration_writes_once_without_cleanup() {
        let store = RecordingStore::new();
        let _state = PersistentState::new(&store, "k", 1u32).unwrap();
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Get("k".to_string()),
                StoreCall::Set("k".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_initial_write_outcome_is_reported() {
        let store = MemoryStore::new();
        let state = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();
        assert!(matches!(state.initial_outcome(), SyncOutcome::Persisted));

        let store = MemoryStore::new().read_only();
        let state = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();
        let warnings = state.initial_outcome().warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].op, PersistOp::Set);
        assert_eq!(warnings[0].key, "name");
        assert_eq!(state.get(), "Kara");
        assert_eq!(raw(&store, "name"), None);
    }

    #[test]
    fn test_failed_write_keeps_value() {
        let store = MemoryStore::with_entries([("name", "\"Ada\"")]).read_only();
        let mut state = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();

        let outcome = state.set("Grace".to_string());
        assert_eq!(outcome.warnings().len(), 1);
        assert_eq!(outcome.warnings()[0].op, PersistOp::Set);
        assert_eq!(state.get(), "Grace");
        assert_eq!(raw(&store, "name").as_deref(), Some("\"Ada\""));
    }

    #[test]
    fn test_failed_removal_still_writes_new_key() {
        let store = RecordingStore::new();
        let mut state = PersistentState::new(&store, "old", 1u32).unwrap();
        store.fail_removes(true);

        let outcome = state.set_key("new").unwrap();
        let warnings = outcome.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].op, PersistOp::Remove);
        assert_eq!(warnings[0].key, "old");
        assert_eq!(store.value("new").as_deref(), Some("1"));

        // The old key is not retried on the next pass
        store.fail_removes(false);
        store.clear_calls();
        state.set(2);
        assert_eq!(
            store.calls(),
            vec![StoreCall::Set("new".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_codec_change_rewrites_entry() {
        let store = MemoryStore::new();
        let mut state = PersistentState::new(&store, "name", "Ada".to_string()).unwrap();
        assert_eq!(raw(&store, "name").as_deref(), Some("\"Ada\""));

        let outcome = state.set_codec(Arc::new(TextCodec));
        assert!(matches!(outcome, SyncOutcome::Persisted));
        assert_eq!(raw(&store, "name").as_deref(), Some("Ada"));

        // Same handle again: no pass
        let codec = state.codec().clone();
        assert!(matches!(state.set_codec(codec), SyncOutcome::Unchanged));
    }

    #[test]
    fn test_empty_text_entry_hydrates_as_default() {
        let store = MemoryStore::new();
        let mut state = PersistentState::builder("name", "Kara".to_string())
            .codec(TextCodec)
            .build(&store)
            .unwrap();
        state.set(String::new());
        assert_eq!(raw(&store, "name").as_deref(), Some(""));

        let state = PersistentState::builder("name", "Kara".to_string())
            .codec(TextCodec)
            .build(&store)
            .unwrap();
        assert_eq!(state.get(), "Kara");
    }

    #[test]
    fn test_serialize_failure_is_a_warning() {
        let store = MemoryStore::new();
        let codec = FnCodec::new(
            |n: &i32| {
                if *n < 0 {
                    Err(CodecError::custom("negative"))
                } else {
                    Ok(n.to_string())
                }
            },
            |s: &str| s.parse().map_err(|_| CodecError::custom("nan")),
        );
        let mut state = PersistentStateBuilder::new("n", DefaultValue::literal(1))
            .codec(codec)
            .build(&store)
            .unwrap();

        let outcome = state.set(-1);
        assert_eq!(outcome.warnings()[0].op, PersistOp::Serialize);
        assert_eq!(*state.get(), -1);
        assert_eq!(raw(&store, "n").as_deref(), Some("1"));
    }

    #[test]
    fn test_replace_and_update() {
        let store = MemoryStore::new();
        let mut state = PersistentState::new(&store, "list", vec![1u8]).unwrap();

        let (old, outcome) = state.replace(vec![2]);
        assert_eq!(old, vec![1]);
        assert!(matches!(outcome, SyncOutcome::Persisted));

        state.update(|v| v.push(3));
        assert_eq!(raw(&store, "list").as_deref(), Some("[2,3]"));
    }

    #[test]
    fn test_into_inner_leaves_entry() {
        let store = MemoryStore::new();
        let state = PersistentState::new(&store, "k", vec![1, 2, 3]).unwrap();
        assert_eq!(state.into_inner(), vec![1, 2, 3]);
        assert_eq!(raw(&store, "k").as_deref(), Some("[1,2,3]"));
    }
}
