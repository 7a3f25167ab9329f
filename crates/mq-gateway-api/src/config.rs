//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use mq_runtime::QueueConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable naming an operator-supplied configuration file
pub const CONFIG_FILE_ENV: &str = "MQG_CONFIG_FILE";

/// Prefix for environment overrides, e.g. `MQG__SERVER__PORT=9090`
pub const ENV_PREFIX: &str = "MQG";

const SYSTEM_CONFIG_FILE: &str = "/etc/mq-gateway/service";
const LOCAL_CONFIG_FILE: &str = "config/service";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Queue client settings
    pub queue: QueueConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from files and the environment.
    ///
    /// Sources, later ones overriding earlier ones:
    ///  1. `/etc/mq-gateway/service.yaml`
    ///  2. `./config/service.yaml`
    ///  3. the file named by `MQG_CONFIG_FILE` (must exist when set)
    ///  4. `MQG__`-prefixed environment variables with `__` as separator
    ///
    /// Missing files are skipped, so an unconfigured environment yields the
    /// defaults. Malformed files or overrides are errors.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit_path = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|path| !path.is_empty());

        Self::load_from(explicit_path.as_deref())
    }

    /// Load configuration using `explicit_path` in place of `MQG_CONFIG_FILE`
    pub fn load_from(explicit_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name(SYSTEM_CONFIG_FILE)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name(LOCAL_CONFIG_FILE)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(path) = explicit_path {
            builder = builder.add_source(
                config::File::with_name(path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }

        let service_config: ServiceConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        service_config.validate()?;
        Ok(service_config)
    }

    /// Check constraints that deserialization cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.shutdown_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "server.shutdown_timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "server.host".to_string(),
            });
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "logging.level '{}' must be one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }

        self.queue
            .validate()
            .map_err(|e| ConfigError::Invalid {
                message: format!("queue: {}", e),
            })
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on; 0 picks an ephemeral port
    pub port: u16,

    /// Upper bound for draining in-flight requests after a termination signal
    pub shutdown_timeout_seconds: u64,

    /// Enable CORS
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            enable_cors: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}
