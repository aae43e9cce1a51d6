//! Configuration loading and validation.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::{
    AcquisitionConfig, Config, DatabaseConfig, DownloadConfig, PortalConfig, RegistryConfig,
    SelectorConfig, StorageConfig, WebDriverConfig,
};
pub use validate::validate_config;

use thiserror::Error;

/// Errors that can occur during configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
