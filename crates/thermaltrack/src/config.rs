//! Configuration management for thermaltrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "thermaltrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "records.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `THERMALTRACK_`)
/// 2. TOML config file at `~/.config/thermaltrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Image upload configuration.
    pub images: ImageConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/thermaltrack/records.db`
    pub database_path: Option<PathBuf>,
}

/// Image upload configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Largest image file accepted for upload, in bytes.
    ///
    /// Payloads are stored inline as base64, so this bounds the size of the
    /// `images` document.
    pub max_file_bytes: u64,
    /// File extensions accepted for upload (lowercase, without the dot).
    pub allowed_extensions: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Default image extensions accepted for upload.
fn default_allowed_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("THERMALTRACK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.images.max_file_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "max_file_bytes must be greater than 0".to_string(),
            });
        }

        if self.images.allowed_extensions.is_empty() {
            return Err(Error::ConfigValidation {
                message: "allowed_extensions cannot be empty".to_string(),
            });
        }

        for ext in &self.images.allowed_extensions {
            if crate::decode::mime_for_extension(ext).is_none() {
                return Err(Error::ConfigValidation {
                    message: format!("unknown image extension: {ext}"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
