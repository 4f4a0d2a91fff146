//! Persistent state adapters for keepstate.
//!
//! A [`PersistentState`] owns a value and keeps it mirrored in a string
//! key-value [`Store`](keepstate_storage::Store):
//! - the value is hydrated from the store once, at construction, falling
//!   back to a [`DefaultValue`] when there is nothing stored
//! - every change to the value, key or [`Codec`] writes the value back,
//!   and only when one of them actually changed
//! - moving to a new key removes the entry under the old key first
//!
//! [`DeferredState`] does the same over an
//! [`AsyncStore`](keepstate_storage::AsyncStore) without ever blocking a
//! write on the store.

pub mod codec;
pub mod config;
pub mod default_value;
pub mod deferred;
pub mod error;
pub mod hydrate;
pub mod state;
pub mod warning;

mod tracker;

pub use codec::{Codec, FnCodec, FnCodecBuilder, JsonCodec, SharedCodec, TextCodec};
pub use config::Config;
pub use default_value::DefaultValue;
pub use deferred::DeferredState;
pub use error::{CodecError, StateError, StateResult};
pub use hydrate::HydrationPolicy;
pub use state::{PersistentState, PersistentStateBuilder};
pub use warning::{PersistOp, PersistenceWarning, SyncOutcome, WarningCause};
