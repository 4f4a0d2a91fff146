//! Shared utilities for keepstate.
//!
//! This crate provides the small pieces every other keepstate crate leans on:
//! - Logging setup with tracing
//! - XDG-style directory lookup for the config file and the default store

pub mod log;
pub mod path;

pub use log::{LogConfig, LogLevel};
