//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `homerc.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use homerc_domain::id::validate_identifier;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Local directory settings.
    pub directory: DirectorySection,
    /// Remote hosts known at startup.
    pub hosts: Vec<HostConfig>,
    /// Integration toggles.
    pub integrations: IntegrationsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Resource directory configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DirectorySection {
    /// Id of this host.
    pub host_id: String,
    /// Address other hosts reach this one at.
    pub address: Option<String>,
    /// Upper bound between two garbage-collection passes.
    pub gc_interval_ms: u64,
}

/// A remote host entry.
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub id: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Per-integration toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// Enable the virtual/demo integration.
    pub virtual_enabled: bool,
    /// Travel time of the virtual shades.
    pub shades_travel_ms: u64,
}

impl Config {
    /// Load configuration from `homerc.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homerc.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMERC_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("HOMERC_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("HOMERC_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("HOMERC_HOST_ID") {
            self.directory.host_id = val;
        }
        if let Ok(val) = std::env::var("HOMERC_GC_INTERVAL_MS") {
            if let Ok(ms) = val.parse() {
                self.directory.gc_interval_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("HOMERC_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.directory.gc_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "gc_interval_ms must be non-zero".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        seen.insert(self.directory.host_id.as_str());
        validate_identifier(&self.directory.host_id, false)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        for host in &self.hosts {
            validate_identifier(&host.id, false)
                .map_err(|err| ConfigError::Validation(err.to_string()))?;
            if !seen.insert(host.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "host '{}' is declared twice",
                    host.id
                )));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.directory.gc_interval_ms)
    }

    #[must_use]
    pub fn shades_travel(&self) -> Duration {
        Duration::from_millis(self.integrations.shades_travel_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homercd=info,homerc=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            host_id: "local".to_string(),
            address: None,
            gc_interval_ms: 60_000,
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            virtual_enabled: true,
            shades_travel_ms: 3_000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
