//! Configuration management.
//!
//! Sources, lowest precedence first:
//! 1. Default values
//! 2. Configuration file (YAML)
//! 3. Environment variables prefixed with `ZANZI_`, using `__` between
//!    nested keys (`ZANZI_RESOLVER__MAX_DEPTH=10` sets `resolver.max_depth`)
//!
//! # Example
//!
//! ```ignore
//! use zanzi_server::config::ServerConfig;
//!
//! let config = ServerConfig::load("zanzi.yaml")?;
//! let resolver_config = config.resolver_config();
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use zanzi_domain::resolver::{ResolverConfig, DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT};

const ENV_PREFIX: &str = "ZANZI";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Check evaluation limits
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Model bootstrap settings
    #[serde(default)]
    pub model: ModelSettings,
}

/// Limits applied to every check.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResolverSettings {
    /// Maximum dispatch hops before a check fails with a depth error
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Per-check deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,

    /// Emit an event when each span closes
    #[serde(default)]
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            include_spans: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Model bootstrap settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ModelSettings {
    /// Model file (DSL, or JSON when the extension is `.json`) written at startup
    pub path: Option<String>,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;
        Ok(server_config)
    }

    /// Load configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;
        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.resolver.max_depth == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "resolver.max_depth must be greater than 0".to_string(),
            });
        }

        if self.resolver.timeout_ms == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "resolver.timeout_ms must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }

    /// The evaluator limits described by this configuration.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_max_depth(self.resolver.max_depth)
            .with_timeout(Duration::from_millis(self.resolver.timeout_ms))
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
