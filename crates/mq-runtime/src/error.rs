//! Error types for queue operations.

use std::time::Duration;
use thiserror::Error;

/// Comprehensive error type for all queue client operations
#[derive(Debug, Error)]
pub enum QueueError {
    /// Caller input was malformed or missing; the backend was never contacted
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The backend failed while executing an operation
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Message not found: {message_id}")]
    NotFound { message_id: String },

    /// The connection could not be opened or closed
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl QueueError {
    /// Check if error is transient, i.e. the same call could succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Backend(e) => e.is_connection_failure(),
            Self::NotFound { .. } => false,
            Self::Connection(e) => e.is_transient(),
            Self::Timeout { .. } => true,
            Self::Configuration(_) => false,
        }
    }

    /// Check if error was caused by caller input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Failures reported by a backend while executing put/get operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Connection to backend lost: {message}")]
    ConnectionLost { message: String },

    #[error("Backend rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected backend response: {message}")]
    Protocol { message: String },

    #[error("Connection has been closed")]
    Closed,

    #[error("Backend unavailable: {message}")]
    Unavailable { message: String },
}

impl BackendError {
    /// Check if the error means the underlying connection is no longer usable
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::ConnectionLost { .. } => true,
            Self::Unavailable { .. } => true,
            Self::Closed => true,
            Self::Rejected { .. } => false,
            Self::Protocol { .. } => false,
        }
    }
}

/// Failures while opening or closing the backend connection
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Connect failed: {message}")]
    ConnectFailed { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Close failed: {message}")]
    CloseFailed { message: String },

    /// The connection manager was closed; no further connections are opened
    #[error("Connection manager is closed")]
    Closed,
}

impl ConnectionError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectFailed { .. } => true,
            Self::AuthenticationFailed { .. } => false,
            Self::CloseFailed { .. } => false,
            Self::Closed => false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

/// Validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
