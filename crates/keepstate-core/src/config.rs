//! Configuration management for keepstate.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/keepstate/config.json`
//! 2. Environment variable: `KEEPSTATE_CONFIG_CONTENT`
//! 3. Project config: `keepstate.json` or `keepstate.jsonc` in the working directory
//!
//! JSONC (JSON with comments) is accepted everywhere.

use crate::hydrate::HydrationPolicy;
use keepstate_util::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding inline configuration.
pub const CONFIG_CONTENT_ENV: &str = "KEEPSTATE_CONFIG_CONTENT";

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    /// Store settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    /// What to do with stored values that fail to decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hydration: Option<HydrationPolicy>,
}

/// Store settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the store file. Relative paths resolve against the directory
    /// of the config file that set them (or the working directory).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Loading order (later sources override earlier):
    /// 1. Global config from `~/.config/keepstate/`
    /// 2. `KEEPSTATE_CONFIG_CONTENT` environment variable
    /// 3. Project config from `project_dir`
    ///
    /// Returns the merged config and the files it was read from.
    pub async fn load(project_dir: Option<&Path>) -> ConfigResult<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        // 1. Load global config
        if let Some(global_dir) = keepstate_util::path::config_dir() {
            for name in &["config.json", "keepstate.json", "keepstate.jsonc"] {
                let path = global_dir.join(name);
                if path.exists() {
                    config = config.merge(Self::load_file(&path).await?);
                    sources.push(path);
                    break;
                }
            }
        }

        // 2. Load from environment variable
        if let Ok(content) = std::env::var(CONFIG_CONTENT_ENV) {
            config = config.merge(Self::parse_jsonc(&content, "<env>")?);
        }

        // 3. Load project config
        if let Some(dir) = project_dir {
            for name in &["keepstate.jsonc", "keepstate.json"] {
                let path = dir.join(name);
                if path.exists() {
                    config = config.merge(Self::load_file(&path).await?);
                    sources.push(path);
                    break;
                }
            }
        }

        Ok((config, sources))
    }

    /// Load configuration from a file.
    ///
    /// A relative store path is anchored to the file's directory.
    pub async fn load_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let mut config = Self::parse_jsonc(&content, &path.display().to_string())?;

        if let (Some(store_path), Some(dir)) = (
            config.store.as_mut().and_then(|s| s.path.as_mut()),
            path.parent(),
        ) {
            *store_path = keepstate_util::path::resolve_store_path(store_path, dir);
        }

        Ok(config)
    }

    /// Parse JSONC (JSON with comments).
    pub fn parse_jsonc(content: &str, source: &str) -> ConfigResult<Self> {
        let stripped = Self::strip_comments(content);

        serde_json::from_str(&stripped).map_err(|e| ConfigError::InvalidJson {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    /// Blank out `//` and `/* */` comments outside of strings.
    ///
    /// Newlines inside comments are kept so parse errors report the right line.
    fn strip_comments(input: &str) -> String {
        #[derive(Clone, Copy)]
        enum Lexer {
            Code,
            Str,
            StrEscape,
            Line,
            Block,
            BlockStar,
        }

        let mut out = String::with_capacity(input.len());
        let mut state = Lexer::Code;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            state = match (state, c) {
                (Lexer::Code, '"') => {
                    out.push(c);
                    Lexer::Str
                }
                (Lexer::Code, '/') if chars.peek() == Some(&'/') => {
                    chars.next();
                    Lexer::Line
                }
                (Lexer::Code, '/') if chars.peek() == Some(&'*') => {
                    chars.next();
                    Lexer::Block
                }
                (Lexer::Code, _) => {
                    out.push(c);
                    Lexer::Code
                }
                (Lexer::Str, '\\') => {
                    out.push(c);
                    Lexer::StrEscape
                }
                (Lexer::Str, '"') => {
                    out.push(c);
                    Lexer::Code
                }
                (Lexer::Str | Lexer::StrEscape, _) => {
                    out.push(c);
                    Lexer::Str
                }
                (Lexer::Line, '\n') => {
                    out.push(c);
                    Lexer::Code
                }
                (Lexer::Line, _) => Lexer::Line,
                (Lexer::Block | Lexer::BlockStar, '\n') => {
                    out.push(c);
                    Lexer::Block
                }
                (Lexer::Block | Lexer::BlockStar, '*') => Lexer::BlockStar,
                (Lexer::BlockStar, '/') => Lexer::Code,
                (Lexer::Block | Lexer::BlockStar, _) => Lexer::Block,
            };
        }

        out
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(self, other: Self) -> Self {
        Self {
            log_level: other.log_level.or(self.log_level),
            store: match (self.store, other.store) {
                (Some(base), Some(over)) => Some(StoreConfig {
                    path: over.path.or(base.path),
                }),
                (base, over) => over.or(base),
            },
            hydration: other.hydration.or(self.hydration),
        }
    }

    /// The store file to use, falling back to the data directory.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.store
            .as_ref()
            .and_then(|s| s.path.clone())
            .or_else(keepstate_util::path::default_store_path)
    }

    /// The hydration policy, strict unless configured otherwise.
    pub fn hydration_policy(&self) -> HydrationPolicy {
        self.hydration.unwrap_or_default()
    }
}
