//! Backend kinds and queue client configuration.

use crate::error::ConfigurationError;
use crate::message::{ConsumptionMode, QueueName, DEFAULT_MAX_QUANTITY, DEFAULT_MESSAGE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Enumeration of supported queue backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    InMemory,
    Rest,
}

impl BackendKind {
    /// Check if the backend can page through messages without removing them
    pub fn supports_multi_browse(&self) -> bool {
        match self {
            Self::InMemory => true,
            Self::Rest => false,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory => write!(f, "in_memory"),
            Self::Rest => write!(f, "rest"),
        }
    }
}

/// Configuration for queue client initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue that all operations target
    pub queue_name: QueueName,

    /// Remove-on-read or peek semantics for get operations
    pub consumption: ConsumptionMode,

    /// Upper bound for a single connect attempt
    pub connect_timeout_ms: u64,

    /// Upper bound for cleanup during shutdown
    pub cleanup_timeout_ms: u64,

    /// Body used when a put request carries no message
    pub default_message: String,

    /// Largest quantity a single put may request
    pub max_quantity: u32,

    pub backend: BackendConfig,
}

impl QueueConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_millis(self.cleanup_timeout_ms)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ConfigurationError::Invalid {
                message: "connect_timeout_ms must be greater than zero".to_string(),
            });
        }

        if self.cleanup_timeout_ms == 0 {
            return Err(ConfigurationError::Invalid {
                message: "cleanup_timeout_ms must be greater than zero".to_string(),
            });
        }

        if self.max_quantity == 0 {
            return Err(ConfigurationError::Invalid {
                message: "max_quantity must be greater than zero".to_string(),
            });
        }

        match &self.backend {
            BackendConfig::InMemory(_) => Ok(()),
            BackendConfig::Rest(rest) => rest.validate(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_name: QueueName::default(),
            consumption: ConsumptionMode::Destructive,
            connect_timeout_ms: 10_000,
            cleanup_timeout_ms: 5_000,
            default_message: DEFAULT_MESSAGE.to_string(),
            max_quantity: DEFAULT_MAX_QUANTITY,
            backend: BackendConfig::default(),
        }
    }
}

/// Backend-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    InMemory(InMemoryConfig),
    Rest(RestBackendConfig),
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::InMemory(_) => BackendKind::InMemory,
            Self::Rest(_) => BackendKind::Rest,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::InMemory(InMemoryConfig::default())
    }
}

/// In-memory backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryConfig {
    /// Maximum number of messages held per queue
    pub max_queue_depth: usize,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            max_queue_depth: 10_000,
        }
    }
}

/// Messaging REST API backend configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestBackendConfig {
    /// Scheme, host and port of the messaging REST endpoint
    pub base_url: String,

    /// Queue manager that owns the queue
    pub queue_manager: String,

    pub username: Option<String>,

    pub password: Option<String>,

    /// Value sent in the CSRF header required for non-GET requests
    pub csrf_token: String,

    /// Per-request timeout
    pub request_timeout_ms: u64,

    /// Browse the queue once while connecting to verify access
    pub verify_on_connect: bool,
}

impl RestBackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| ConfigurationError::Invalid {
            message: format!("base_url '{}' is not a valid URL: {}", self.base_url, e),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::Invalid {
                message: format!("base_url scheme '{}' must be http or https", url.scheme()),
            });
        }

        if self.queue_manager.is_empty() {
            return Err(ConfigurationError::Missing {
                key: "queue.backend.queue_manager".to_string(),
            });
        }

        if self.username.is_some() && self.password.is_none() {
            return Err(ConfigurationError::Missing {
                key: "queue.backend.password".to_string(),
            });
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigurationError::Invalid {
                message: "request_timeout_ms must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for RestBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:9443".to_string(),
            queue_manager: "QM1".to_string(),
            username: None,
            password: None,
            csrf_token: "mq-gateway".to_string(),
            request_timeout_ms: 30_000,
            verify_on_connect: true,
        }
    }
}

impl std::fmt::Debug for RestBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackendConfig")
            .field("base_url", &self.base_url)
            .field("queue_manager", &self.queue_manager)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("csrf_token", &self.csrf_token)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("verify_on_connect", &self.verify_on_connect)
            .finish()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
