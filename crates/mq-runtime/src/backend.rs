//! Traits implemented by queue backends.
//!
//! A [`QueueBackend`] knows how to open a [`BackendConnection`]. The
//! [`ConnectionManager`](crate::connection::ConnectionManager) owns the single
//! live connection and hands it to concurrent callers, so connections take
//! `&self` everywhere and must tolerate concurrent use.

use crate::error::{BackendError, ConnectionError};
use crate::message::{ConsumptionMode, Message, MessageId, QueueName};
use crate::config::BackendKind;
use async_trait::async_trait;
use std::sync::Arc;

/// Factory for backend connections
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Open a new logical connection to the backend
    async fn connect(&self) -> Result<Arc<dyn BackendConnection>, ConnectionError>;

    /// Get backend kind
    fn kind(&self) -> BackendKind;
}

/// A live connection to a queue backend
#[async_trait]
pub trait BackendConnection: Send + Sync {
    /// Enqueue a single message and return the identifier the backend assigned
    async fn put(&self, queue: &QueueName, body: &str) -> Result<MessageId, BackendError>;

    /// Read up to `max` messages in backend order
    async fn get(
        &self,
        queue: &QueueName,
        max: u32,
        mode: ConsumptionMode,
    ) -> Result<Vec<Message>, BackendError>;

    /// Read the message with the given identifier, if present
    async fn get_by_id(
        &self,
        queue: &QueueName,
        id: &MessageId,
        mode: ConsumptionMode,
    ) -> Result<Option<Message>, BackendError>;

    /// Release backend resources held by this connection
    async fn close(&self) -> Result<(), BackendError>;

    /// Check whether the connection still accepts operations
    fn is_open(&self) -> bool;
}
