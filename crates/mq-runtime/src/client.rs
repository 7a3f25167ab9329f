//! Client traits and implementations for queue operations.

use crate::backend::{BackendConnection, QueueBackend};
use crate::backends::{InMemoryBackend, RestBackend};
use crate::config::{BackendConfig, InMemoryConfig, QueueConfig};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::{BackendError, QueueError};
use crate::message::{GetLimit, Message, MessageId, PutOutcome, PutRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Status reported for a put whose enqueues all succeeded
pub const PUT_STATUS: &str = "Put was successful";

/// Main interface for queue operations.
///
/// Raw caller input (message text, quantity and limit strings) is normalized
/// here, so every front end shares one set of validation rules.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Enqueue `message` as many times as the normalized quantity says
    async fn put(
        &self,
        message: Option<String>,
        quantity_raw: Option<String>,
    ) -> Result<PutOutcome, QueueError>;

    /// Read up to `limit_raw` messages (one when absent)
    async fn get(&self, limit_raw: Option<String>) -> Result<Vec<Message>, QueueError>;

    /// Read the message with the given identifier
    async fn get_by_id(&self, id: &MessageId) -> Result<Message, QueueError>;

    /// Close the backend connection, bounded by the configured cleanup timeout
    async fn cleanup(&self) -> Result<(), QueueError>;

    /// Current state of the underlying connection
    fn connection_state(&self) -> ConnectionState;

    /// Check whether `cleanup` has run; no further operations will succeed
    fn is_closed(&self) -> bool;
}

/// Factory for creating queue clients with appropriate backends
pub struct QueueClientFactory;

impl QueueClientFactory {
    /// Create queue client from configuration
    pub fn create_client(config: QueueConfig) -> Result<Box<dyn QueueClient>, QueueError> {
        config.validate()?;

        let backend: Arc<dyn QueueBackend> = match &config.backend {
            BackendConfig::InMemory(in_memory) => Arc::new(InMemoryBackend::new(in_memory.clone())),
            BackendConfig::Rest(rest) => {
                Arc::new(RestBackend::new(rest.clone(), config.queue_name.clone())?)
            }
        };

        info!(
            backend = %config.backend.kind(),
            queue = %config.queue_name,
            consumption = ?config.consumption,
            "Created queue client"
        );

        Ok(Box::new(StandardQueueClient::with_backend(backend, config)))
    }

    /// Create test client with in-memory backend
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mq_runtime::QueueClientFactory;
    ///
    /// # tokio_test::block_on(async {
    /// let client = QueueClientFactory::create_test_client();
    /// client
    ///     .put(Some("hello".to_string()), Some("2".to_string()))
    ///     .await
    ///     .unwrap();
    ///
    /// let messages = client.get(Some("5".to_string())).await.unwrap();
    /// assert_eq!(messages.len(), 2);
    /// # });
    /// ```
    pub fn create_test_client() -> Box<dyn QueueClient> {
        let backend = InMemoryBackend::new(InMemoryConfig::default());
        Box::new(StandardQueueClient::with_backend(
            Arc::new(backend),
            QueueConfig::default(),
        ))
    }
}

/// Standard queue client implementation
pub struct StandardQueueClient {
    manager: ConnectionManager,
    config: QueueConfig,
}

impl StandardQueueClient {
    pub fn new(manager: ConnectionManager, config: QueueConfig) -> Self {
        Self { manager, config }
    }

    /// Create a client whose connection manager uses the configured connect timeout
    pub fn with_backend(backend: Arc<dyn QueueBackend>, config: QueueConfig) -> Self {
        let manager = ConnectionManager::new(backend, config.connect_timeout());
        Self::new(manager, config)
    }

    /// Pass `result` through, invalidating `connection` when the error shows it is broken
    async fn observe<T>(
        &self,
        connection: &Arc<dyn BackendConnection>,
        result: Result<T, BackendError>,
    ) -> Result<T, QueueError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_connection_failure() {
                    self.manager.report_failure(connection).await;
                }
                Err(QueueError::Backend(e))
            }
        }
    }
}

#[async_trait]
impl QueueClient for StandardQueueClient {
    #[instrument(skip(self, message), fields(queue = %self.config.queue_name))]
    async fn put(
        &self,
        message: Option<String>,
        quantity_raw: Option<String>,
    ) -> Result<PutOutcome, QueueError> {
        let request = PutRequest::parse(
            message.as_deref(),
            quantity_raw.as_deref(),
            &self.config.default_message,
            self.config.max_quantity,
        )?;
        debug!(quantity = request.quantity(), "Attempting put");

        let connection = self.manager.acquire().await?;
        let mut message_ids = Vec::new();

        for attempt in 1..=request.quantity() {
            let result = connection
                .put(&self.config.queue_name, request.message())
                .await;

            match self.observe(&connection, result).await {
                Ok(id) => message_ids.push(id),
                Err(e) => {
                    warn!(
                        attempt,
                        committed = message_ids.len(),
                        error = %e,
                        "Put failed; remaining enqueues abandoned"
                    );
                    return Err(e);
                }
            }
        }

        info!(count = message_ids.len(), "Put completed");
        Ok(PutOutcome {
            status: PUT_STATUS.to_string(),
            message_ids,
        })
    }

    #[instrument(skip(self), fields(queue = %self.config.queue_name))]
    async fn get(&self, limit_raw: Option<String>) -> Result<Vec<Message>, QueueError> {
        let limit = GetLimit::parse(limit_raw.as_deref())?;

        let connection = self.manager.acquire().await?;
        let result = connection
            .get(&self.config.queue_name, limit.get(), self.config.consumption)
            .await;
        let messages = self.observe(&connection, result).await?;

        debug!(
            requested = limit.get(),
            returned = messages.len(),
            "Get completed"
        );
        Ok(messages)
    }

    #[instrument(skip(self), fields(queue = %self.config.queue_name))]
    async fn get_by_id(&self, id: &MessageId) -> Result<Message, QueueError> {
        let connection = self.manager.acquire().await?;
        let result = connection
            .get_by_id(&self.config.queue_name, id, self.config.consumption)
            .await;

        self.observe(&connection, result)
            .await?
            .ok_or_else(|| QueueError::NotFound {
                message_id: id.to_string(),
            })
    }

    async fn cleanup(&self) -> Result<(), QueueError> {
        let timeout = self.config.cleanup_timeout();

        match tokio::time::timeout(timeout, self.manager.close()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(QueueError::Connection(e)),
            Err(_) => {
                warn!(?timeout, "Cleanup did not finish in time");
                Err(QueueError::Timeout {
                    operation: "cleanup".to_string(),
                    duration: timeout,
                })
            }
        }
    }

    fn connection_state(&self) -> ConnectionState {
        self.manager.state()
    }

    fn is_closed(&self) -> bool {
        self.manager.is_closed()
    }
}
