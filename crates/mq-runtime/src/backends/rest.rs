//! Messaging REST API backend.
//!
//! Talks to a queue manager through its messaging REST endpoint using plain
//! HTTP calls:
//!
//! | Operation          | Request                                   | Success         |
//! |--------------------|-------------------------------------------|-----------------|
//! | put                | `POST   .../queue/{q}/message`            | `201` + id hdr  |
//! | destructive get    | `DELETE .../queue/{q}/message`            | `200` / `204`   |
//! | browse             | `GET    .../queue/{q}/message`            | `200` / `204`   |
//! | get by id          | either of the above with `?messageId=...` | `200` / `204`   |
//!
//! `204 No Content` means no (matching) message is available. Each call
//! returns at most one message, so a destructive get repeats the request and a
//! browse get returns at most one message.
//!
//! HTTP is connectionless, so a "connection" here is a configured client plus
//! an optional verification request made while connecting.

use crate::backend::{BackendConnection, QueueBackend};
use crate::config::{BackendKind, RestBackendConfig};
use crate::error::{BackendError, ConfigurationError, ConnectionError};
use crate::message::{ConsumptionMode, Message, MessageId, QueueName, Timestamp};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "rest_tests.rs"]
mod tests;

/// Response header carrying the message identifier
pub const MESSAGE_ID_HEADER: &str = "ibm-mq-md-messageId";

/// Request header the REST endpoint requires on state-changing requests
pub const CSRF_HEADER: &str = "ibm-mq-rest-csrf-token";

const TEXT_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

// ============================================================================
// RestBackend
// ============================================================================

/// Backend that speaks the messaging REST API
pub struct RestBackend {
    config: RestBackendConfig,
    http_client: HttpClient,
    verify_queue: QueueName,
}

impl RestBackend {
    /// Create a REST backend.
    ///
    /// `verify_queue` is browsed while connecting when
    /// [`RestBackendConfig::verify_on_connect`] is set.
    pub fn new(
        config: RestBackendConfig,
        verify_queue: QueueName,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigurationError::Invalid {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            http_client,
            verify_queue,
        })
    }
}

#[async_trait]
impl QueueBackend for RestBackend {
    async fn connect(&self) -> Result<Arc<dyn BackendConnection>, ConnectionError> {
        let connection = RestConnection {
            http_client: self.http_client.clone(),
            config: self.config.clone(),
            open: AtomicBool::new(true),
        };

        if self.config.verify_on_connect {
            let response = connection
                .request(Method::GET, &self.verify_queue)
                .send()
                .await
                .map_err(|e| ConnectionError::ConnectFailed {
                    message: format!("{} unreachable: {}", self.config.base_url, e),
                })?;

            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => {}
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(ConnectionError::AuthenticationFailed {
                        message: format!(
                            "queue manager {} refused credentials (status {})",
                            self.config.queue_manager,
                            response.status().as_u16()
                        ),
                    });
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ConnectionError::ConnectFailed {
                        message: format!(
                            "verifying queue {} failed with status {}: {}",
                            self.verify_queue,
                            status.as_u16(),
                            body
                        ),
                    });
                }
            }
        }

        debug!(
            base_url = %self.config.base_url,
            queue_manager = %self.config.queue_manager,
            "Opened REST connection"
        );

        Ok(Arc::new(connection))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Rest
    }
}

// ============================================================================
// RestConnection
// ============================================================================

struct RestConnection {
    http_client: HttpClient,
    config: RestBackendConfig,
    open: AtomicBool,
}

impl RestConnection {
    fn message_url(&self, queue: &QueueName) -> String {
        format!(
            "{}/ibmmq/rest/v2/messaging/qmgr/{}/queue/{}/message",
            self.config.base_url.trim_end_matches('/'),
            self.config.queue_manager,
            queue
        )
    }

    /// Build a request carrying the CSRF header and credentials
    fn request(&self, method: Method, queue: &QueueName) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, self.message_url(queue))
            .header(CSRF_HEADER, &self.config.csrf_token);

        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        request
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Closed)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::ConnectionLost {
                    message: format!("Request timeout: {}", e),
                }
            } else if e.is_connect() {
                BackendError::ConnectionLost {
                    message: format!("Connection failed: {}", e),
                }
            } else {
                BackendError::ConnectionLost {
                    message: format!("HTTP request failed: {}", e),
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "REST backend returned an error");

        Err(match status {
            StatusCode::SERVICE_UNAVAILABLE => BackendError::Unavailable { message: body },
            _ => BackendError::Rejected {
                status: status.as_u16(),
                message: body,
            },
        })
    }

    /// Issue a single read; `None` when no message is available
    async fn read_one(
        &self,
        queue: &QueueName,
        id: Option<&MessageId>,
        mode: ConsumptionMode,
    ) -> Result<Option<Message>, BackendError> {
        let method = match mode {
            ConsumptionMode::Destructive => Method::DELETE,
            ConsumptionMode::Browse => Method::GET,
        };

        let mut request = self.request(method, queue);
        if let Some(id) = id {
            request = request.query(&[("messageId", id.as_str())]);
        }

        let response = self.send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let id = message_id_from(&response)?;
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::ConnectionLost {
                message: format!("Failed to read response body: {}", e),
            })?;

        Ok(Some(Message::new(id, body, Timestamp::now())))
    }
}

fn message_id_from(response: &Response) -> Result<MessageId, BackendError> {
    response
        .headers()
        .get(MESSAGE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<MessageId>().ok())
        .ok_or_else(|| BackendError::Protocol {
            message: format!("response is missing the {} header", MESSAGE_ID_HEADER),
        })
}

#[async_trait]
impl BackendConnection for RestConnection {
    async fn put(&self, queue: &QueueName, body: &str) -> Result<MessageId, BackendError> {
        self.ensure_open()?;

        let request = self
            .request(Method::POST, queue)
            .header(reqwest::header::CONTENT_TYPE, TEXT_CONTENT_TYPE)
            .body(body.to_string());

        let response = self.send(request).await?;
        message_id_from(&response)
    }

    async fn get(
        &self,
        queue: &QueueName,
        max: u32,
        mode: ConsumptionMode,
    ) -> Result<Vec<Message>, BackendError> {
        self.ensure_open()?;

        if mode == ConsumptionMode::Browse {
            if max > 1 {
                debug!(requested = max, "REST browse returns at most one message");
            }
            return Ok(self.read_one(queue, None, mode).await?.into_iter().collect());
        }

        let mut messages = Vec::new();
        while messages.len() < max as usize {
            self.ensure_open()?;
            match self.read_one(queue, None, mode).await {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => break,
                Err(e) => {
                    if !messages.is_empty() {
                        warn!(
                            consumed = messages.len(),
                            error = %e,
                            "Destructive get failed after consuming messages"
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(messages)
    }

    async fn get_by_id(
        &self,
        queue: &QueueName,
        id: &MessageId,
        mode: ConsumptionMode,
    ) -> Result<Option<Message>, BackendError> {
        self.ensure_open()?;
        self.read_one(queue, Some(id), mode).await
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
