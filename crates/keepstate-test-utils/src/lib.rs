//! Testing utilities and mocks for keepstate.
//!
//! - **Mocks**: store doubles that record traffic and fail on demand
//!
//! # Example Usage
//!
//! ```rust
//! use keepstate_storage::Store;
//! use keepstate_test_utils::{RecordingStore, StoreCall};
//!
//! let store = RecordingStore::new();
//! store.set("name", "\"Ada\"").unwrap();
//! assert_eq!(store.calls(), vec![StoreCall::Set("name".into(), "\"Ada\"".into())]);
//! ```

pub mod mocks;

pub use mocks::{RecordingStore, StoreCall};
