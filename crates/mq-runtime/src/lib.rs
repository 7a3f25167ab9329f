//! # MQ Runtime
//!
//! Queue client runtime for the MQ gateway: a single managed connection to a
//! message-queue backend plus the put/get/get-by-id/cleanup operations built
//! on top of it.
//!
//! This library provides:
//! - Normalization of raw caller input (message text, quantity, limit)
//! - A connection manager that connects lazily, reconnects after failures and
//!   closes exactly once
//! - Destructive or browse consumption, selected by configuration
//! - In-memory and messaging REST API backends
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all queue operations
//! - [`message`] - Messages, identifiers and request normalization
//! - [`config`] - Backend kinds and client configuration
//! - [`backend`] - Traits implemented by backends
//! - [`backends`] - Concrete backends
//! - [`connection`] - Connection lifecycle management
//! - [`client`] - Client trait and implementation

// Module declarations
pub mod backend;
pub mod backends;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod message;

// Re-export commonly used types at crate root for convenience
pub use backend::{BackendConnection, QueueBackend};
pub use backends::{InMemoryBackend, RestBackend};
pub use client::{QueueClient, QueueClientFactory, StandardQueueClient, PUT_STATUS};
pub use config::{BackendConfig, BackendKind, InMemoryConfig, QueueConfig, RestBackendConfig};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{BackendError, ConfigurationError, ConnectionError, QueueError, ValidationError};
pub use message::{
    ConsumptionMode, GetLimit, Message, MessageId, PutOutcome, PutRequest, QueueName, Timestamp,
    DEFAULT_LIMIT, DEFAULT_MAX_QUANTITY, DEFAULT_MESSAGE,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
