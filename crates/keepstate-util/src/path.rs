//! Path utilities.
//!
//! This module locates the directories keepstate reads configuration from
//! and keeps its default store in.

use std::path::{Path, PathBuf};

/// File name of the default store inside the data directory.
pub const STORE_FILE_NAME: &str = "store.json";

/// Get the keepstate configuration directory.
///
/// This follows XDG conventions on Linux/macOS:
/// - `$XDG_CONFIG_HOME/keepstate` if set
/// - `~/.config/keepstate` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("keepstate"))
}

/// Get the keepstate data directory.
///
/// This follows XDG conventions:
/// - `$XDG_DATA_HOME/keepstate` if set
/// - `~/.local/share/keepstate` otherwise
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("keepstate"))
}

/// Default location of the store file when nothing is configured.
pub fn default_store_path() -> Option<PathBuf> {
    data_dir().map(|p| p.join(STORE_FILE_NAME))
}

/// Resolve a configured store path against a base directory.
///
/// Absolute paths are returned unchanged; relative ones are joined onto `base`.
pub fn resolve_store_path(configured: &Path, base: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        base.join(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_dir() {
        let dir = config_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("keepstate"));
    }

    #[test]
    fn test_default_store_path() {
        let path = default_store_path().unwrap();
        assert!(path.ends_with("keepstate/store.json"));
    }

    #[test]
    fn test_resolve_relative_store_path() {
        let dir = tempdir().unwrap();
        let resolved = resolve_store_path(Path::new("state/store.json"), dir.path());
        assert_eq!(resolved, dir.path().join("state").join("store.json"));
    }

    #[test]
    fn test_resolve_absolute_store_path() {
        let dir = tempdir().unwrap();
        let absolute = dir.path().join("elsewhere.json");
        let resolved = resolve_store_path(&absolute, Path::new("/ignored"));
        assert_eq!(resolved, absolute);
    }
}
