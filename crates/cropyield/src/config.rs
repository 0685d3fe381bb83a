//! Configuration management for cropyield.
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
const DATA_DIR_NAME: &str = "cropyield";

/// Default history database file name.
const DATABASE_FILE_NAME: &str = "history.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "CROPYIELD_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CROPYIELD_`, sections split on `__`)
/// 2. TOML config file at `~/.config/cropyield/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model artifact configuration.
    pub model: ModelConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Prediction history configuration.
    pub history: HistoryConfig,
}

/// Model artifact configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the serialized model. Relative paths resolve against the
    /// working directory.
    pub path: PathBuf,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Prediction history configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record successful predictions and show them in the sidebar.
    pub enabled: bool,
    /// Path to the database file.
    /// Defaults to `~/.local/share/cropyield/history.db`
    pub database_path: Option<PathBuf>,
    /// Number of predictions shown under "Recent Predictions".
    pub recent_limit: usize,
    /// Maximum number of predictions to retain.
    /// Set to 0 for unlimited.
    pub max_entries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/crop_yield_model.json"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            database_path: None, // Resolved to the data dir at runtime
            recent_limit: 3,
            max_entries: 10_000,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing, or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

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
        if self.model.path.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                message: "model.path must not be empty".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(Error::ConfigValidation {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        if self.server.host.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "server.host must not be empty".to_string(),
            });
        }

        if self.history.recent_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "history.recent_limit must be greater than 0".to_string(),
            });
        }

        if self.history.max_entries != 0 && self.history.max_entries < self.history.recent_limit {
            return Err(Error::ConfigValidation {
                message: format!(
                    "history.max_entries ({}) cannot be less than history.recent_limit ({})",
                    self.history.max_entries, self.history.recent_limit
                ),
            });
        }

        Ok(())
    }

    /// Get the history database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.history
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// The address the server binds, as `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Maximum retained history entries, `None` for unlimited.
    #[must_use]
    pub fn max_history_entries(&self) -> Option<usize> {
        (self.history.max_entries != 0).then_some(self.history.max_entries)
    }
}
