//! Response types, query parameters, and request bodies for the API.

use mq_runtime::ConnectionState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(test)]
#[path = "responses_tests.rs"]
mod tests;

/// Acknowledgement returned by get-by-id before the lookup runs
pub const REQUEST_RECEIVED: &str = "Request was received";

// ============================================================================
// Response Types
// ============================================================================

/// Put response
#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub status: String,
}

/// Acknowledgement response
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
}

impl AckResponse {
    pub fn received() -> Self {
        Self {
            status: REQUEST_RECEIVED.to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub connection: ConnectionState,
    pub version: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for `/api/mqget`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GetParams {
    pub limit: Option<String>,
}

impl GetParams {
    /// Read the parameters from decoded query pairs; a repeated key keeps its first value
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            limit: first_value(pairs, "limit"),
        }
    }
}

/// Query parameters for `/api/mqgetbyid`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GetByIdParams {
    pub msgid: Option<String>,
}

impl GetByIdParams {
    /// Read the parameters from decoded query pairs; a repeated key keeps its first value
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            msgid: first_value(pairs, "msgid"),
        }
    }
}

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.clone())
}

/// Fields of a put request body.
///
/// The body is read leniently: a missing or non-JSON body behaves like an
/// empty object. `message` is only taken from a JSON string; `quantity` may be
/// a string or a number, numbers being rendered back to text.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PutBody {
    pub message: Option<String>,
    pub quantity: Option<String>,
}

impl PutBody {
    pub fn from_slice(body: &[u8]) -> Self {
        let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        let quantity = match value.get("quantity") {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        };

        Self { message, quantity }
    }
}
