//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::links::UplinkConfig;
use crate::state::ServerIdentity;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Our identity on the link.
    pub server: ServerConfig,
    /// Where to link to.
    pub uplink: UplinkConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Pseudo-clients to introduce during our burst.
    #[serde(default)]
    pub pseudoclient: Vec<PseudoClientBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "services.example.net").
    pub name: String,
    /// Server ID for TS6 (3 characters).
    pub sid: String,
    /// Server description.
    #[serde(default = "default_description")]
    pub description: String,
}

impl ServerConfig {
    pub fn identity(&self) -> ServerIdentity {
        ServerIdentity {
            name: self.name.clone(),
            sid: self.sid.clone(),
            description: self.description.clone(),
        }
    }
}

fn default_description() -> String {
    "IRC Services".to_string()
}

/// Logging configuration. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A services client introduced on every link.
#[derive(Debug, Clone, Deserialize)]
pub struct PseudoClientBlock {
    pub nick: String,
    #[serde(default = "default_user")]
    pub user: String,
    /// Defaults to the server name.
    pub host: Option<String>,
    #[serde(default)]
    pub realname: String,
    /// Channels joined once the uplink's burst is over.
    #[serde(default)]
    pub channels: Vec<String>,
}

fn default_user() -> String {
    "services".to_string()
}
