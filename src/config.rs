//! Server configuration.

use crate::service::ServiceConfig;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ServerConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Configuration of the game server binary.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database path. Sessions are kept in memory only when unset.
    #[serde(default)]
    database_url: Option<String>,

    /// Seconds the side to move has per turn. Zero disables turn timers.
    #[serde(default)]
    turn_timeout_secs: u64,

    /// Seconds after which an unchanged session is swept.
    #[serde(default = "default_idle_timeout_secs")]
    idle_timeout_secs: u64,

    /// Seconds between idle sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,

    /// Seed for session ids and dice.
    #[serde(default)]
    seed: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_idle_timeout_secs() -> u64 {
    60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            turn_timeout_secs: 0,
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Applies `DATABASE_URL` from the environment, if set.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            debug!(%url, "Database URL taken from environment");
            self.database_url = Some(url);
        }
        self
    }

    /// Overrides the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Interval of the idle sweeper.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Service settings derived from this configuration.
    pub fn service_config(&self) -> ServiceConfig {
        let turn_timeout =
            (self.turn_timeout_secs > 0).then(|| Duration::from_secs(self.turn_timeout_secs));
        ServiceConfig::default()
            .with_turn_timeout(turn_timeout)
            .with_idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .with_seed(self.seed)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
