//! Configuration management for the mirror.

use std::env;
use std::path::PathBuf;

/// Mirror configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// JSON file the tree is persisted to, if any
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(port) => port.trim().parse().map_err(|_| ConfigError::InvalidPort(port))?,
            None => defaults.port,
        };

        let data_file = match lookup("MIRROR_DATA_FILE") {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::InvalidDataFile(path));
            }
            Some(path) => Some(PathBuf::from(path)),
            None => None,
        };

        Ok(Self {
            host,
            port,
            data_file,
        })
    }

    /// `host:port` to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value '{0}'")]
    InvalidPort(String),

    #[error("Invalid MIRROR_DATA_FILE value '{0}'")]
    InvalidDataFile(String),
}
