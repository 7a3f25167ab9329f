//! Connection management for queue backends.
//!
//! The [`ConnectionManager`] owns the single logical connection to a backend.
//! It opens the connection lazily, replaces it after a connection failure, and
//! closes it exactly once at shutdown.
//!
//! ## State machine
//!
//! ```text
//! Disconnected --connect ok--> Connected --connection failure--> Disconnected
//! Disconnected --connect------> Connecting --failure--> Disconnected
//! any state ----close---------> Closing --> Disconnected (terminal)
//! ```
//!
//! Connect attempts are serialised: concurrent callers that find no usable
//! connection queue behind a single attempt and reuse its connection. Once
//! connected, callers share the connection without further locking.

use crate::backend::{BackendConnection, QueueBackend};
use crate::error::ConnectionError;
use serde::Serialize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;

/// Lifecycle state of the managed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        };
        write!(f, "{}", name)
    }
}

struct Inner {
    state: ConnectionState,
    connection: Option<Arc<dyn BackendConnection>>,
    /// Set by `close`; no connection is opened afterwards
    closed: bool,
}

/// Owner of the single logical connection to a queue backend
pub struct ConnectionManager {
    backend: Arc<dyn QueueBackend>,
    connect_timeout: Duration,
    inner: RwLock<Inner>,
    connect_lock: Mutex<()>,
}

impl ConnectionManager {
    /// Create a manager in the `Disconnected` state; nothing is opened until the first acquire
    pub fn new(backend: Arc<dyn QueueBackend>, connect_timeout: Duration) -> Self {
        Self {
            backend,
            connect_timeout,
            inner: RwLock::new(Inner {
                state: ConnectionState::Disconnected,
                connection: None,
                closed: false,
            }),
            connect_lock: Mutex::new(()),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.read().state
    }

    /// Check whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.read().closed
    }

    /// Return a usable connection, connecting once if there is none.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::Closed`] after [`close`](Self::close)
    /// - the backend's connect error, or `ConnectFailed` when the attempt
    ///   exceeds the connect timeout
    pub async fn acquire(&self) -> Result<Arc<dyn BackendConnection>, ConnectionError> {
        if let Some(connection) = self.current()? {
            return Ok(connection);
        }

        let _connecting = self.connect_lock.lock().await;

        // Another caller may have connected while we waited
        if let Some(connection) = self.current()? {
            return Ok(connection);
        }

        self.begin_connect()?;
        debug!(backend = %self.backend.kind(), "Connecting to queue backend");

        let attempt = tokio::time::timeout(self.connect_timeout, self.backend.connect()).await;
        let result = attempt.unwrap_or_else(|_| {
            Err(ConnectionError::ConnectFailed {
                message: format!("connect timed out after {:?}", self.connect_timeout),
            })
        });

        match result {
            Ok(connection) => {
                let raced_with_close = {
                    let mut inner = self.write();
                    if inner.closed {
                        true
                    } else {
                        inner.state = ConnectionState::Connected;
                        inner.connection = Some(Arc::clone(&connection));
                        false
                    }
                };

                if raced_with_close {
                    debug!("Connection manager closed during connect; discarding new connection");
                    if let Err(e) = connection.close().await {
                        warn!(error = %e, "Failed to close connection opened during shutdown");
                    }
                    return Err(ConnectionError::Closed);
                }

                info!(backend = %self.backend.kind(), "Connected to queue backend");
                Ok(connection)
            }
            Err(e) => {
                {
                    let mut inner = self.write();
                    if !inner.closed {
                        inner.state = ConnectionState::Disconnected;
                    }
                }
                warn!(backend = %self.backend.kind(), error = %e, "Failed to connect to queue backend");
                Err(e)
            }
        }
    }

    /// Mark `connection` as broken so the next acquire reconnects.
    ///
    /// Ignored when `connection` has already been replaced or the manager is closed.
    pub async fn report_failure(&self, connection: &Arc<dyn BackendConnection>) {
        let stale = {
            let mut inner = self.write();
            let is_current = inner
                .connection
                .as_ref()
                .is_some_and(|current| std::ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(connection)));

            if inner.closed || !is_current {
                None
            } else {
                inner.state = ConnectionState::Disconnected;
                inner.connection.take()
            }
        };

        if let Some(stale) = stale {
            warn!("Queue backend connection failed; will reconnect on next use");
            if let Err(e) = stale.close().await {
                debug!(error = %e, "Closing failed connection reported an error");
            }
        }
    }

    /// Close the connection and refuse any further connects.
    ///
    /// Idempotent: calls after the first return `Ok(())` without touching the backend.
    pub async fn close(&self) -> Result<(), ConnectionError> {
        let connection = {
            let mut inner = self.write();
            if inner.closed {
                return Ok(());
            }
            inner.closed = true;
            inner.state = ConnectionState::Closing;
            inner.connection.take()
        };

        // Reaches Disconnected even when the caller stops waiting for the close
        let _finish = FinishClose(self);

        let result = match connection {
            Some(connection) => connection
                .close()
                .await
                .map_err(|e| ConnectionError::CloseFailed {
                    message: e.to_string(),
                }),
            None => Ok(()),
        };

        match &result {
            Ok(()) => info!("Queue backend connection closed"),
            Err(e) => warn!(error = %e, "Queue backend connection closed with error"),
        }

        result
    }

    /// Usable connection, if any; clears a connection that has closed underneath us
    fn current(&self) -> Result<Option<Arc<dyn BackendConnection>>, ConnectionError> {
        {
            let inner = self.read();
            if inner.closed {
                return Err(ConnectionError::Closed);
            }
            match (&inner.state, &inner.connection) {
                (ConnectionState::Connected, Some(connection)) if connection.is_open() => {
                    return Ok(Some(Arc::clone(connection)));
                }
                (ConnectionState::Connected, _) => {}
                _ => return Ok(None),
            }
        }

        let mut inner = self.write();
        if !inner.closed && inner.state == ConnectionState::Connected {
            inner.state = ConnectionState::Disconnected;
            inner.connection = None;
        }
        Ok(None)
    }

    fn begin_connect(&self) -> Result<(), ConnectionError> {
        let mut inner = self.write();
        if inner.closed {
            return Err(ConnectionError::Closed);
        }
        inner.state = ConnectionState::Connecting;
        Ok(())
    }

    fn finish_close(&self) {
        self.write().state = ConnectionState::Disconnected;
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Completes `Closing -> Disconnected` when dropped
struct FinishClose<'a>(&'a ConnectionManager);

impl Drop for FinishClose<'_> {
    fn drop(&mut self) {
        self.0.finish_close();
    }
}
