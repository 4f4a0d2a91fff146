//! Logging setup using tracing.
//!
//! Library crates only emit events through the `tracing` macros; the binary
//! decides where they go by calling [`init`] once at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

/// Verbosity used when `RUST_LOG` is not set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    /// The directive understood by [`EnvFilter`].
    pub fn directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive())
    }
}

/// Where and how much to log.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Fallback verbosity.
    pub level: LogLevel,
    /// Install the filter but drop every event.
    pub silent: bool,
    /// Annotate events with source file and line.
    pub show_location: bool,
}

/// Install the global subscriber, writing to stderr.
///
/// Returns `false` when a subscriber was already installed.
pub fn init(config: LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.directive()));
    let registry = tracing_subscriber::registry().with(filter);

    if config.silent {
        return registry.try_init().is_ok();
    }

    let layer = fmt_layer::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_location)
        .with_file(config.show_location)
        .with_line_number(config.show_location);
    registry.with(layer).try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        let level: LogLevel = serde_json::from_str("\"trace\"").unwrap();
        assert_eq!(level, LogLevel::Trace);
        let level: LogLevel = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(level, LogLevel::Warn);
        assert!(serde_json::from_str::<LogLevel>("\"loud\"").is_err());
        assert_eq!(serde_json::to_string(&LogLevel::Debug).unwrap(), "\"debug\"");
    }

    #[test]
    fn test_level_order() {
        assert!(LogLevel::Debug < LogLevel::Warn);
        assert_eq!(LogLevel::default(), LogLevel::Warn);
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_second_init_is_rejected() {
        let config = LogConfig {
            silent: true,
            ..Default::default()
        };
        init(config.clone());
        assert!(!init(config));
    }
}
