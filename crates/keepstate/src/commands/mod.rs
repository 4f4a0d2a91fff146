//! Command handlers for the keepstate CLI.

pub mod config;
pub mod greet;
pub mod store;

pub use config::*;
pub use greet::*;
pub use store::*;

use anyhow::Context as _;
use keepstate_core::Config;
use keepstate_storage::FileStore;
use keepstate_util::log::{self, LogConfig, LogLevel};
use std::path::{Path, PathBuf};

/// Everything a command needs: merged configuration and where the store lives.
pub struct Context {
    pub config: Config,
    pub sources: Vec<PathBuf>,
    pub store_path: PathBuf,
}

impl Context {
    /// Load configuration, set up logging and resolve the store path.
    ///
    /// `store_override` (from `--store`) wins over the configured path.
    pub async fn load(
        cwd: &Path,
        store_override: Option<PathBuf>,
        verbose: bool,
    ) -> anyhow::Result<Self> {
        let (config, sources) = Config::load(Some(cwd)).await?;

        init_logging(&config, verbose);
        tracing::debug!(?sources, "Loaded configuration");

        let store_path = match store_override {
            Some(path) => keepstate_util::path::resolve_store_path(&path, cwd),
            None => config
                .store_path()
                .context("could not determine a data directory; pass --store")?,
        };

        Ok(Self {
            config,
            sources,
            store_path,
        })
    }

    /// Open the file store.
    pub fn open_store(&self) -> anyhow::Result<FileStore> {
        FileStore::open(&self.store_path)
            .with_context(|| format!("cannot open store {}", self.store_path.display()))
    }
}

/// Initialize logging to stderr; `--verbose` forces debug output.
fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        config.log_level.unwrap_or_default()
    };

    log::init(LogConfig {
        level,
        silent: false,
        show_location: verbose,
    });
}

/// Print version information.
pub fn print_version() {
    println!("keepstate {}", env!("CARGO_PKG_VERSION"));
}
