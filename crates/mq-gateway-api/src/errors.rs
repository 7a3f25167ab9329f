//! Error types for the HTTP service

use crate::responses::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use mq_runtime::QueueError;
use tracing::{error, warn};

/// Reply to a put whose quantity could not be read
pub const PUT_INVALID_INPUT: &str = "Please provide a valid input";

/// Reply to a get whose limit could not be read
pub const GET_INVALID_INPUT: &str = "Please provide a valid input.";

/// Reply to a get-by-id without a `msgid` query parameter
pub const MISSING_MESSAGE_ID: &str = "request was missing msgid";

/// Request handler errors.
///
/// Every variant renders as `500 Internal Server Error` with a
/// `{"error": <message>}` body, matching the gateway's published contract.
/// Validation failures carry a fixed message; queue failures carry the
/// underlying error text.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caller input was rejected before reaching the queue
    #[error("{message}")]
    InvalidInput { message: &'static str },

    #[error("{}", MISSING_MESSAGE_ID)]
    MissingMessageId,

    /// The queue client failed
    #[error("{0}")]
    Queue(#[from] QueueError),
}

impl ApiError {
    /// Map a put failure, replacing validation detail with the fixed reply
    pub fn from_put(error: QueueError) -> Self {
        match error {
            QueueError::Validation(_) => Self::InvalidInput {
                message: PUT_INVALID_INPUT,
            },
            other => Self::Queue(other),
        }
    }

    /// Map a get failure, replacing validation detail with the fixed reply
    pub fn from_get(error: QueueError) -> Self {
        match error {
            QueueError::Validation(_) => Self::InvalidInput {
                message: GET_INVALID_INPUT,
            },
            other => Self::Queue(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::InvalidInput { message } => warn!(error = %message, "Rejected request input"),
            Self::MissingMessageId => warn!("Get by id request was missing msgid"),
            Self::Queue(e) => error!(error = %e, transient = e.is_transient(), "Queue operation failed"),
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}
