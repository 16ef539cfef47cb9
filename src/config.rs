//! Configuration module for TASKBOARD.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, TaskboardError};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/taskboard.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/taskboard.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Limits and identities used by the board core.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardsConfig {
    /// Maximum title length for boards and blocks (in characters).
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    /// Maximum board description length (in characters).
    #[serde(default = "default_max_description_length")]
    pub max_description_length: usize,
    /// Maximum number of boards plus blocks accepted in one batch.
    #[serde(default = "default_max_batch_entities")]
    pub max_batch_entities: usize,
    /// Username of the service account used for internal notifications.
    #[serde(default = "default_system_account_username")]
    pub system_account_username: String,
}

fn default_max_title_length() -> usize {
    255
}

fn default_max_description_length() -> usize {
    10_000
}

fn default_max_batch_entities() -> usize {
    1000
}

fn default_system_account_username() -> String {
    "boards".to_string()
}

impl Default for BoardsConfig {
    fn default() -> Self {
        Self {
            max_title_length: default_max_title_length(),
            max_description_length: default_max_description_length(),
            max_batch_entities: default_max_batch_entities(),
            system_account_username: default_system_account_username(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Board limits.
    #[serde(default)]
    pub boards: BoardsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(TaskboardError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TaskboardError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `TASKBOARD_DATABASE_PATH`: Override the database file path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("TASKBOARD_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Every limit must be non-zero and the system account needs a name.
    pub fn validate(&self) -> Result<()> {
        if self.boards.max_title_length == 0 {
            return Err(TaskboardError::Config(
                "boards.max_title_length must be greater than zero".to_string(),
            ));
        }
        if self.boards.max_description_length == 0 {
            return Err(TaskboardError::Config(
                "boards.max_description_length must be greater than zero".to_string(),
            ));
        }
        if self.boards.max_batch_entities == 0 {
            return Err(TaskboardError::Config(
                "boards.max_batch_entities must be greater than zero".to_string(),
            ));
        }
        if self.boards.system_account_username.trim().is_empty() {
            return Err(TaskboardError::Config(
                "boards.system_account_username is not set".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(TaskboardError::Config(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
