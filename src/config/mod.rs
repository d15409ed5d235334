//! Configuration management for fetchflow
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use fetchflow::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Dispatcher workers: {}", config.dispatcher.workers);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `FETCHFLOW__<section>__<key>`
//!
//! Examples:
//! - `FETCHFLOW__DISPATCHER__WORKERS=16`
//! - `FETCHFLOW__DISPATCHER__POLL_INTERVAL=250ms`
//! - `FETCHFLOW__BULK__TASK_TIMEOUT=30s`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/fetchflow.toml`.
//! This can be overridden using the `FETCHFLOW_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{BulkConfig, Config, DispatcherConfig, HttpConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`FETCHFLOW__*`)
    /// 2. TOML file (default: `config/fetchflow.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
