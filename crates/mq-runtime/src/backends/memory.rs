//! In-memory queue backend for testing and development.
//!
//! This module provides a process-local broker that:
//! - Keeps one FIFO queue per queue name
//! - Hands out connections that can be closed independently
//! - Honours destructive and browse reads
//! - Exposes observation and fault-injection hooks for tests
//!
//! Clones of an [`InMemoryBackend`] share the same broker, so a test can keep
//! a handle while the client owns another.

use crate::backend::{BackendConnection, QueueBackend};
use crate::config::{BackendKind, InMemoryConfig};
use crate::error::{BackendError, ConnectionError};
use crate::message::{ConsumptionMode, Message, MessageId, QueueName, Timestamp};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Reason code reported when a queue has reached its maximum depth
pub const QUEUE_FULL_REASON: u16 = 2053;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// Storage for all queues
struct QueueStorage {
    queues: HashMap<QueueName, VecDeque<Message>>,
    config: InMemoryConfig,
}

impl QueueStorage {
    fn new(config: InMemoryConfig) -> Self {
        Self {
            queues: HashMap::new(),
            config,
        }
    }

    /// Get or create a queue
    fn get_or_create_queue(&mut self, queue_name: &QueueName) -> &mut VecDeque<Message> {
        self.queues.entry(queue_name.clone()).or_default()
    }
}

/// Test hooks and counters
#[derive(Default)]
struct Faults {
    unavailable: AtomicBool,
    puts_before_failure: Mutex<Option<u64>>,
    connect_delay: Mutex<Option<Duration>>,
    close_delay: Mutex<Option<Duration>>,
    put_delay: Mutex<Option<Duration>>,
    put_count: AtomicU64,
    connect_count: AtomicU64,
}

impl Faults {
    /// Consume one put from the failure budget; `false` means this put must fail
    fn take_put_permit(&self) -> bool {
        let mut budget = self
            .puts_before_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match budget.as_mut() {
            None => true,
            Some(0) => false,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
        }
    }

    fn delay(slot: &Mutex<Option<Duration>>) -> Option<Duration> {
        *slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Shared {
    storage: RwLock<QueueStorage>,
    faults: Faults,
}

// ============================================================================
// InMemoryBackend
// ============================================================================

/// In-memory queue backend
#[derive(Clone)]
pub struct InMemoryBackend {
    shared: Arc<Shared>,
}

impl InMemoryBackend {
    /// Create new in-memory backend with configuration
    pub fn new(config: InMemoryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                storage: RwLock::new(QueueStorage::new(config)),
                faults: Faults::default(),
            }),
        }
    }

    /// Number of messages successfully written since creation
    pub fn put_count(&self) -> u64 {
        self.shared.faults.put_count.load(Ordering::SeqCst)
    }

    /// Number of connections opened since creation
    pub fn connect_count(&self) -> u64 {
        self.shared.faults.connect_count.load(Ordering::SeqCst)
    }

    /// Number of messages currently held in `queue`
    pub async fn depth(&self, queue: &QueueName) -> usize {
        let storage = self.shared.storage.read().await;
        storage.queues.get(queue).map_or(0, VecDeque::len)
    }

    /// Simulate the backend going away or coming back.
    ///
    /// While unavailable, connects fail and operations on existing connections
    /// fail with [`BackendError::ConnectionLost`].
    pub fn set_available(&self, available: bool) {
        self.shared
            .faults
            .unavailable
            .store(!available, Ordering::SeqCst);
    }

    /// Let the next `successful_puts` puts succeed and fail every put after that
    pub fn fail_puts_after(&self, successful_puts: u64) {
        *self
            .shared
            .faults
            .puts_before_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(successful_puts);
    }

    /// Delay every connect attempt by `delay`
    pub fn set_connect_delay(&self, delay: Duration) {
        *self
            .shared
            .faults
            .connect_delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(delay);
    }

    /// Delay every put by `delay` before it reaches the queue
    pub fn set_put_delay(&self, delay: Duration) {
        *self
            .shared
            .faults
            .put_delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(delay);
    }

    /// Delay every connection close by `delay`
    pub fn set_close_delay(&self, delay: Duration) {
        *self
            .shared
            .faults
            .close_delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(delay);
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(InMemoryConfig::default())
    }
}

#[async_trait]
impl QueueBackend for InMemoryBackend {
    async fn connect(&self) -> Result<Arc<dyn BackendConnection>, ConnectionError> {
        if let Some(delay) = Faults::delay(&self.shared.faults.connect_delay) {
            tokio::time::sleep(delay).await;
        }

        if self.shared.faults.unavailable.load(Ordering::SeqCst) {
            return Err(ConnectionError::ConnectFailed {
                message: "in-memory backend is unavailable".to_string(),
            });
        }

        let count = self.shared.faults.connect_count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(connection = count, "Opened in-memory connection");

        Ok(Arc::new(InMemoryConnection {
            shared: Arc::clone(&self.shared),
            open: AtomicBool::new(true),
        }))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::InMemory
    }
}

// ============================================================================
// InMemoryConnection
// ============================================================================

/// Connection handed out by [`InMemoryBackend`]
struct InMemoryConnection {
    shared: Arc<Shared>,
    open: AtomicBool,
}

impl InMemoryConnection {
    fn ensure_usable(&self) -> Result<(), BackendError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }

        if self.shared.faults.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::ConnectionLost {
                message: "in-memory backend is unavailable".to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl BackendConnection for InMemoryConnection {
    async fn put(&self, queue: &QueueName, body: &str) -> Result<MessageId, BackendError> {
        if let Some(delay) = Faults::delay(&self.shared.faults.put_delay) {
            tokio::time::sleep(delay).await;
        }

        self.ensure_usable()?;

        if !self.shared.faults.take_put_permit() {
            return Err(BackendError::Unavailable {
                message: "injected put failure".to_string(),
            });
        }

        let mut storage = self.shared.storage.write().await;
        let max_depth = storage.config.max_queue_depth;
        let messages = storage.get_or_create_queue(queue);
        if messages.len() >= max_depth {
            return Err(BackendError::Rejected {
                status: QUEUE_FULL_REASON,
                message: format!("queue {} is full ({} messages)", queue, max_depth),
            });
        }

        let id = MessageId::generate();
        messages.push_back(Message::new(id.clone(), body, Timestamp::now()));
        self.shared.faults.put_count.fetch_add(1, Ordering::SeqCst);

        Ok(id)
    }

    async fn get(
        &self,
        queue: &QueueName,
        max: u32,
        mode: ConsumptionMode,
    ) -> Result<Vec<Message>, BackendError> {
        self.ensure_usable()?;

        let max = usize::try_from(max).unwrap_or(usize::MAX);
        let mut storage = self.shared.storage.write().await;
        let messages = storage.get_or_create_queue(queue);

        let taken = match mode {
            ConsumptionMode::Destructive => {
                let count = max.min(messages.len());
                messages.drain(..count).collect()
            }
            ConsumptionMode::Browse => messages.iter().take(max).cloned().collect(),
        };

        Ok(taken)
    }

    async fn get_by_id(
        &self,
        queue: &QueueName,
        id: &MessageId,
        mode: ConsumptionMode,
    ) -> Result<Option<Message>, BackendError> {
        self.ensure_usable()?;

        let mut storage = self.shared.storage.write().await;
        let messages = storage.get_or_create_queue(queue);
        let Some(position) = messages.iter().position(|m| &m.id == id) else {
            return Ok(None);
        };

        let found = match mode {
            ConsumptionMode::Destructive => messages.remove(position),
            ConsumptionMode::Browse => messages.get(position).cloned(),
        };

        Ok(found)
    }

    async fn close(&self) -> Result<(), BackendError> {
        if let Some(delay) = Faults::delay(&self.shared.faults.close_delay) {
            tokio::time::sleep(delay).await;
        }

        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
