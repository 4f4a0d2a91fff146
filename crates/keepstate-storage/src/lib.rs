//! String key-value stores for keepstate.
//!
//! This crate defines the storage contract the state adapters talk to and
//! ships a few backends:
//! - In-memory storage (tests, ephemeral state)
//! - A single JSON document on disk (the default durable store)
//! - One file per key under a directory (async, for slow stores)

pub mod dir;
pub mod error;
pub mod file;
pub mod memory;

pub use dir::DirStore;
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::rc::Rc;
use std::sync::Arc;

/// A synchronous, string-keyed, string-valued store.
///
/// Implementations provide their own interior mutability; every method
/// takes `&self` so one store can back many adapters.
pub trait Store {
    /// Read the raw value stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the entry under `key`.
    ///
    /// Removing a missing key is not an error; the returned flag tells
    /// whether an entry actually existed.
    fn remove(&self, key: &str) -> StorageResult<bool>;
}

/// The asynchronous counterpart of [`Store`], for remote or slow backends.
#[async_trait]
pub trait AsyncStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the entry under `key`, reporting whether it existed.
    async fn remove(&self, key: &str) -> StorageResult<bool>;
}

macro_rules! forward_store {
    ($($ptr:ty),*) => {
        $(
            impl<S: Store + ?Sized> Store for $ptr {
                fn get(&self, key: &str) -> StorageResult<Option<String>> {
                    (**self).get(key)
                }

                fn set(&self, key: &str, value: &str) -> StorageResult<()> {
                    (**self).set(key, value)
                }

                fn remove(&self, key: &str) -> StorageResult<bool> {
                    (**self).remove(key)
                }
            }
        )*
    };
}

forward_store!(&S, Box<S>, Rc<S>, Arc<S>);

#[async_trait]
impl<S: AsyncStore + ?Sized> AsyncStore for Arc<S> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        (**self).remove(key).await
    }
}
