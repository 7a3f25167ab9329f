//! Common test utilities for mq-gateway integration tests
//!
//! This module provides:
//! - A gateway served on an ephemeral local port with a controllable signal source
//! - Helpers for building service configurations

use mq_gateway_api::{run_server, ServiceConfig, ServiceError, TerminationSignal};
use mq_runtime::{QueueClient, QueueClientFactory, QueueConfig};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};

/// A running gateway
#[allow(dead_code)]
pub struct TestGateway {
    pub base_url: String,
    pub client: Arc<dyn QueueClient>,
    pub http: reqwest::Client,
    signals: mpsc::Sender<TerminationSignal>,
    handle: JoinHandle<Result<(), ServiceError>>,
}

#[allow(dead_code)]
impl TestGateway {
    /// Serve an in-memory queue with default settings
    pub async fn start() -> Self {
        Self::start_with(test_config()).await
    }

    /// Serve the queue described by `config.queue`
    pub async fn start_with(config: ServiceConfig) -> Self {
        let client: Arc<dyn QueueClient> = Arc::from(
            QueueClientFactory::create_client(config.queue.clone())
                .expect("Setup: queue client should build"),
        );
        Self::start_with_client(config, client).await
    }

    pub async fn start_with_client(config: ServiceConfig, client: Arc<dyn QueueClient>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Setup: ephemeral port should bind");
        let base_url = format!(
            "http://{}",
            listener.local_addr().expect("Setup: local address")
        );

        let (signals, receiver) = mpsc::channel(8);
        let handle = tokio::spawn(run_server(
            listener,
            config,
            Arc::clone(&client),
            receiver,
        ));

        Self {
            base_url,
            client,
            http: reqwest::Client::new(),
            signals,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Deliver a termination signal as if sent to the process.
    ///
    /// Signals sent after the server has stopped are dropped.
    pub async fn signal(&self, signal: TerminationSignal) {
        let _ = self.signals.send(signal).await;
    }

    /// Wait for the server task to finish
    pub async fn stopped(self) -> Result<(), ServiceError> {
        tokio::time::timeout(std::time::Duration::from_secs(10), self.handle)
            .await
            .expect("server should stop after a termination signal")
            .expect("server task should not panic")
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Service configuration for an in-memory queue with short timeouts
#[allow(dead_code)]
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.shutdown_timeout_seconds = 2;
    config.queue = QueueConfig {
        cleanup_timeout_ms: 1_000,
        ..QueueConfig::default()
    };
    config
}
