//! Message types for queue operations including core domain identifiers.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Placeholder body used when a put request carries no message
pub const DEFAULT_MESSAGE: &str = "Default Message app running in Cloud Engine";

/// Number of messages requested by a get when the caller supplies no limit
pub const DEFAULT_LIMIT: u32 = 1;

/// Largest number of copies a single put enqueues unless configured otherwise
pub const DEFAULT_MAX_QUANTITY: u32 = 10_000;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name using the MQ object-name character set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueueName(String);

impl QueueName {
    pub const MAX_LENGTH: usize = 48;

    /// Create new queue name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        if name.is_empty() || name.len() > Self::MAX_LENGTH {
            return Err(ValidationError::OutOfRange {
                field: "queue_name".to_string(),
                message: format!("must be 1-{} characters", Self::MAX_LENGTH),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "only ASCII alphanumeric, '.' and '_' allowed".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QueueName {
    /// The developer queue provisioned by a default queue manager install
    fn default() -> Self {
        Self("DEV.QUEUE.1".to_string())
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for QueueName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QueueName> for String {
    fn from(value: QueueName) -> Self {
        value.0
    }
}

/// Backend-assigned identifier of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate new random message ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "msgid".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dt = s.parse::<DateTime<Utc>>()?;
        Ok(Self::from_datetime(dt))
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// A message held by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub body: String,
    pub enqueued_at: Timestamp,
}

impl Message {
    pub fn new(id: MessageId, body: impl Into<String>, enqueued_at: Timestamp) -> Self {
        Self {
            id,
            body: body.into(),
            enqueued_at,
        }
    }
}

/// Whether reading a message removes it from the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionMode {
    /// Remove-on-read
    #[default]
    Destructive,
    /// Peek without removing
    Browse,
}

/// A normalized put request; `quantity` is always at least one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    message: String,
    quantity: u32,
}

impl PutRequest {
    /// Build a put request from raw caller input.
    ///
    /// An empty or missing message is replaced by `default_message`. The
    /// quantity text is read as a leading integer; a negative value is
    /// negated and zero becomes one. Missing or non-numeric quantity text is
    /// rejected, as is a normalized quantity above `max_quantity`.
    pub fn parse(
        message: Option<&str>,
        quantity_raw: Option<&str>,
        default_message: &str,
        max_quantity: u32,
    ) -> Result<Self, ValidationError> {
        let message = match message {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => default_message.to_string(),
        };

        let parsed = parse_integer_prefix("quantity", quantity_raw.unwrap_or(""))?;
        let normalized = match parsed {
            n if n < 0 => n
                .checked_neg()
                .ok_or_else(|| quantity_out_of_range(max_quantity))?,
            0 => 1,
            n => n,
        };

        let quantity = u32::try_from(normalized)
            .ok()
            .filter(|quantity| *quantity <= max_quantity)
            .ok_or_else(|| quantity_out_of_range(max_quantity))?;

        Ok(Self { message, quantity })
    }

    /// Build a put request from an already-normalized quantity
    pub fn new(message: impl Into<String>, quantity: u32) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            message: message.into(),
            quantity,
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

fn quantity_out_of_range(max_quantity: u32) -> ValidationError {
    ValidationError::OutOfRange {
        field: "quantity".to_string(),
        message: format!("must not exceed {}", max_quantity),
    }
}

/// Maximum number of messages a single get may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetLimit(u32);

impl GetLimit {
    /// Parse a limit from its textual form; missing or empty text yields the default of one
    pub fn parse(limit_raw: Option<&str>) -> Result<Self, ValidationError> {
        let raw = match limit_raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Self(DEFAULT_LIMIT)),
        };

        let parsed = parse_integer_prefix("limit", raw)?;
        if parsed <= 0 {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        u32::try_from(parsed)
            .map(Self)
            .map_err(|_| ValidationError::OutOfRange {
                field: "limit".to_string(),
                message: format!("must not exceed {}", u32::MAX),
            })
    }

    pub fn new(limit: u32) -> Result<Self, ValidationError> {
        if limit == 0 {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        Ok(Self(limit))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for GetLimit {
    fn default() -> Self {
        Self(DEFAULT_LIMIT)
    }
}

/// Result of a successful put
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutOutcome {
    pub status: String,
    pub message_ids: Vec<MessageId>,
}

/// Read the leading integer of `raw`.
///
/// Leading whitespace is skipped, an optional sign is accepted, and the
/// longest run of ASCII digits that follows is used; anything after it is
/// ignored. Text without digits in that position is an error.
pub(crate) fn parse_integer_prefix(field: &str, raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = rest
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };

    if digits.is_empty() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            message: format!("'{}' is not a number", raw),
        });
    }

    let magnitude = digits
        .parse::<i64>()
        .map_err(|_| ValidationError::OutOfRange {
            field: field.to_string(),
            message: format!("'{}' is too large", raw),
        })?;

    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
