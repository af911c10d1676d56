//! Configuration loading for room-cli.
//!
//! Configuration is read from a TOML file: the `--config` path if given,
//! otherwise `<config dir>/roomsync/config.toml` when it exists, otherwise
//! built-in defaults. Command-line flags override file values.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use roomsync_client::ClientConfig;

/// Root configuration for room-cli.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Server connection settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Who we are in rooms and chat.
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Server connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// WebSocket URL of the room server (default: ws://localhost:3000/ws).
    #[serde(default = "default_url")]
    pub url: String,
    /// Seconds to wait for the connection to open (default: 10).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Identity settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Player name used when creating, joining and chatting.
    pub name: Option<String>,
}

fn default_url() -> String {
    "ws://localhost:3000/ws".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// The connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl CliConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolve the configuration to use.
    ///
    /// An explicit path must exist. The default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, server: Option<String>, name: Option<String>) -> Self {
        if let Some(url) = server {
            self.server.url = url;
        }
        if let Some(name) = name {
            self.identity.name = Some(name);
        }
        self
    }

    /// Build the client library configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.server.url).with_connect_timeout(self.server.connect_timeout())
    }

    /// The configured player name, if any non-blank one is set.
    pub fn player_name(&self) -> Option<&str> {
        self.identity
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Default config file location: `<config dir>/roomsync/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "roomsync")?;
    Some(dirs.config_dir().join("config.toml"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}
