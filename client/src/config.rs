//! Configuration management for the client.

use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://tasksync.db";
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// SQLite connection URL for the Local Store
    pub database_url: String,
    /// Base URL of the Remote Store; `None` runs local-only
    pub remote_url: Option<String>,
    /// Timeout for one remote request
    pub remote_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            remote_url: None,
            remote_timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, reading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("TASKSYNC_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let remote_url = lookup("TASKSYNC_REMOTE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let remote_timeout = match lookup("TASKSYNC_REMOTE_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_REMOTE_TIMEOUT_MS,
        };

        Ok(Self {
            database_url,
            remote_url,
            remote_timeout: Duration::from_millis(remote_timeout),
        })
    }

    /// A local-only configuration for the given database.
    pub fn local(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    pub fn with_remote(mut self, remote_url: impl Into<String>) -> Self {
        self.remote_url = Some(remote_url.into());
        self
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TASKSYNC_REMOTE_TIMEOUT_MS value: {0}")]
    InvalidTimeout(String),
}
