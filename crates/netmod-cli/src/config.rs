//! Run configuration
//!
//! A collection run is configured by a JSON file:
//!
//! ```json
//! {
//!   "api_token": "...",
//!   "api_params": {"min_active_users": 25, "min_version": "4.0"},
//!   "output_targets": [
//!     {"type": "sqlite", "path": "netmod.db"},
//!     {"type": "jsonl", "path": "events.jsonl"}
//!   ]
//! }
//! ```

use mastodon_client::directory::{DirectoryFilters, DEFAULT_API_URL};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON or is missing required keys
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config parsed but fails validation
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// One export destination
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputTarget {
    /// SQLite database file
    Sqlite {
        /// Database file path
        path: String,
    },
    /// Line-delimited JSON file
    Jsonl {
        /// Output file path
        path: String,
    },
}

/// Top-level run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// instances.social bearer token
    pub api_token: String,
    /// Directory list endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Directory query filters
    #[serde(default)]
    pub api_params: DirectoryFilters,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Override for the HTTP user agent
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Export destinations, written in order
    pub output_targets: Vec<OutputTarget>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load and validate configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::Invalid("api_token is empty".to_string()));
        }
        if self.output_targets.is_empty() {
            return Err(ConfigError::Invalid(
                "output_targets must name at least one destination".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"{
                "api_token": "secret",
                "api_url": "https://directory.example/list",
                "api_params": {"min_active_users": 25, "min_version": "4.0"},
                "timeout_secs": 10,
                "user_agent": "NetModTest/0.1",
                "output_targets": [
                    {"type": "sqlite", "path": "netmod.db"},
                    {"type": "jsonl", "path": "events.jsonl"}
                ]
            }"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api_token, "secret");
        assert_eq!(config.api_url, "https://directory.example/list");
        assert_eq!(config.api_params.min_active_users, Some(25));
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.output_targets.len(), 2);
        assert_eq!(
            config.output_targets[0],
            OutputTarget::Sqlite { path: "netmod.db".to_string() }
        );
    }

    #[test]
    fn test_defaults() {
        let file = write_config(
            r#"{
                "api_token": "secret",
                "output_targets": [{"type": "sqlite", "path": "netmod.db"}]
            }"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.is_none());
        assert!(config.api_params.min_active_users.is_none());
    }

    #[test]
    fn test_empty_token_rejected() {
        let file = write_config(
            r#"{
                "api_token": "  ",
                "output_targets": [{"type": "sqlite", "path": "netmod.db"}]
            }"#,
        );

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_no_outputs_rejected() {
        let file = write_config(r#"{"api_token": "secret", "output_targets": []}"#);

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/config.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
