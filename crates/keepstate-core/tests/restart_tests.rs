//! Persistence across restarts.
//!
//! A "restart" here drops every adapter and store handle and reopens the
//! store file from disk.

use keepstate_core::{PersistentState, StateError, SyncOutcome};
use keepstate_storage::{DirStore, FileStore, Store};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Preferences {
    theme: String,
    font_size: u8,
}

fn open(path: &Path) -> FileStore {
    FileStore::open(path).expect("Failed to open store")
}

#[test]
fn test_greeting_scenario() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.json");

    {
        let store = open(&path);
        let mut name = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();
        assert_eq!(name.get(), "Kara");
        assert_eq!(store.get("name").unwrap().as_deref(), Some("\"Kara\""));

        assert!(matches!(name.set("Ada".to_string()), SyncOutcome::Persisted));
        assert_eq!(store.get("name").unwrap().as_deref(), Some("\"Ada\""));
    }

    let store = open(&path);
    let name = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();
    assert_eq!(name.get(), "Ada");
}

#[test]
fn test_key_migration_survives_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.json");

    {
        let store = open(&path);
        let mut name = PersistentState::new(&store, "name", "Kara".to_string()).unwrap();
        name.set("Ada".to_string());
        name.set_key("username").unwrap();
    }

    let store = open(&path);
    assert_eq!(store.keys().unwrap(), vec!["username"]);
    assert_eq!(store.get("username").unwrap().as_deref(), Some("\"Ada\""));
}

#[test]
fn test_structured_value_survives_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.json");

    {
        let store = open(&path);
        let mut prefs = PersistentState::with_factory(&store, "prefs", || Preferences {
            theme: "light".to_string(),
            font_size: 12,
        })
        .unwrap();
        prefs.update(|p| p.theme = "dark".to_string());
    }

    let store = open(&path);
    let prefs = PersistentState::with_factory(&store, "prefs", || -> Preferences {
        panic!("stored value must win")
    })
    .unwrap();
    assert_eq!(
        prefs.get(),
        &Preferences {
            theme: "dark".to_string(),
            font_size: 12,
        }
    );
}

#[test]
fn test_two_adapters_share_a_store() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(open(&temp.path().join("store.json")));

    let mut first = PersistentState::new(store.clone(), "first", 1u32).unwrap();
    let mut second = PersistentState::new(store.clone(), "second", 2u32).unwrap();
    first.set(10);
    second.set(20);

    assert_eq!(store.get("first").unwrap().as_deref(), Some("10"));
    assert_eq!(store.get("second").unwrap().as_deref(), Some("20"));
}

#[test]
fn test_malformed_entry_on_disk_is_decode_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.json");
    std::fs::write(&path, r#"{"name": "not-json"}"#).unwrap();

    let store = open(&path);
    let err = PersistentState::new(&store, "name", "Kara".to_string()).unwrap_err();
    assert!(matches!(err, StateError::Decode { ref key, .. } if key == "name"));
}

#[tokio::test]
async fn test_deferred_state_survives_restart() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("entries");

    {
        let (mut name, _warnings) = PersistentState::builder("name", "Kara".to_string())
            .build_deferred(DirStore::new(&dir))
            .await
            .unwrap();
        name.set("Ada".to_string());
        name.set_key("username").unwrap();
        name.flush().await;
    }

    let (name, _warnings) = PersistentState::builder("username", "Kara".to_string())
        .build_deferred(DirStore::new(&dir))
        .await
        .unwrap();
    assert_eq!(name.get(), "Ada");
    assert!(!dir.join("name.entry").exists());
}
