//! Configuration for Cairn.
//!
//! Settings persist to disk as RON, accept CLI overrides via clap, support
//! hot-reload detection, and stay forward/backward compatible through
//! `#[serde(default)]` on every section.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, LightingConfig, StorageConfig, default_config_dir};
pub use error::ConfigError;
