//! # MQ Gateway HTTP Service
//!
//! HTTP surface over a message-queue backend.
//!
//! This service provides:
//! - `POST /api/mqput` to enqueue a message one or more times
//! - `GET /api/mqget` to read a bounded batch of messages
//! - `GET /api/mqgetbyid` to look up a message by identifier in the background
//! - Health and Prometheus metrics endpoints
//! - Orderly shutdown on SIGINT, SIGTERM and SIGHUP

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod metrics;
pub mod responses;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

pub use self::config::{LoggingConfig, ServerConfig, ServiceConfig};
pub use errors::{ApiError, ConfigError, ServiceError};
pub use lifecycle::{LifecycleController, ShutdownOutcome, TerminationSignal};
pub use metrics::{Outcome, ServiceMetrics};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use mq_runtime::{Message, MessageId, QueueClient, QueueError};
use responses::{AckResponse, GetByIdParams, GetParams, HealthResponse, PutBody, PutResponse};
use std::{future::IntoFuture, sync::Arc};
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, instrument, warn};

/// Capacity of the channel carrying termination signals to the server
const SIGNAL_CHANNEL_CAPACITY: usize = 8;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Queue client shared by all requests
    pub client: Arc<dyn QueueClient>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(client: Arc<dyn QueueClient>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { client, metrics }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let queue_routes = Router::new()
        .route("/api/mqput", post(handle_put))
        .route("/api/mqget", get(handle_get))
        .route("/api/mqgetbyid", get(handle_get_by_id));

    let observability_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(queue_routes)
        .merge(observability_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until a termination signal arrives
pub async fn start_server(
    config: ServiceConfig,
    client: Arc<dyn QueueClient>,
) -> Result<(), ServiceError> {
    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    let (sender, signals) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
    let forwarder = tokio::spawn(lifecycle::forward_termination_signals(sender));

    let result = run_server(listener, config, client, signals).await;
    forwarder.abort();
    result
}

/// Serve on `listener` until the first signal arrives on `signals`.
///
/// The first signal runs the shutdown routine (queue cleanup), then the
/// server stops accepting connections and drains in-flight requests for at
/// most `server.shutdown_timeout_seconds`. Later signals are logged and
/// ignored.
pub async fn run_server(
    listener: TcpListener,
    config: ServiceConfig,
    client: Arc<dyn QueueClient>,
    mut signals: mpsc::Receiver<TerminationSignal>,
) -> Result<(), ServiceError> {
    let metrics = ServiceMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("Failed to initialize metrics: {}", e),
        })
    })?;

    let lifecycle = Arc::new(LifecycleController::new(
        Arc::clone(&client),
        config.queue.cleanup_timeout(),
    ));

    let mut app = create_router(AppState::new(client, metrics));
    if config.server.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    if let Ok(local) = listener.local_addr() {
        info!(address = %local, "Starting HTTP server");
    }

    let (drain_sender, drain_receiver) = tokio::sync::watch::channel(false);
    let watcher = tokio::spawn(async move {
        let Some(signal) = signals.recv().await else {
            warn!("Termination signal source closed; serving until the process is stopped");
            std::future::pending::<()>().await;
            return;
        };

        info!(%signal, "Received termination signal");
        let outcome = lifecycle.shutdown(&signal.to_string()).await;
        debug!(?outcome, "Shutdown routine finished");
        let _ = drain_sender.send(true);

        while let Some(signal) = signals.recv().await {
            let ignored = lifecycle.shutdown(&signal.to_string()).await;
            debug!(%signal, ?ignored, "Ignored termination signal during shutdown");
        }
    });

    let mut graceful_receiver = drain_receiver.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = graceful_receiver.wait_for(|draining| *draining).await;
        })
        .into_future();
    tokio::pin!(server);

    let mut drain_receiver = drain_receiver;
    let drain_started = async move { drain_receiver.wait_for(|draining| *draining).await.is_ok() };
    let result = tokio::select! {
        result = &mut server => result,
        true = drain_started => {
            let drain_timeout = config.server.shutdown_timeout();
            info!(timeout = ?drain_timeout, "Draining in-flight requests");
            match tokio::time::timeout(drain_timeout, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?drain_timeout, "In-flight requests did not finish in time");
                    Ok(())
                }
            }
        }
    };

    watcher.abort();

    result.map_err(|e| ServiceError::ServerFailed {
        message: e.to_string(),
    })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

// ============================================================================
// Queue Handlers
// ============================================================================

/// Enqueue the body's message `quantity` times
#[instrument(skip(state, body))]
async fn handle_put(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PutResponse>, ApiError> {
    let PutBody { message, quantity } = PutBody::from_slice(&body);
    info!(?quantity, "MQ put request submitted");

    match state.client.put(message, quantity).await {
        Ok(outcome) => {
            state.metrics.record_operation("put", Outcome::Success);
            state.metrics.record_put(outcome.message_ids.len());
            Ok(Json(PutResponse {
                status: outcome.status,
            }))
        }
        Err(e) => {
            state.metrics.record_operation("put", outcome_of(&e));
            Err(ApiError::from_put(e))
        }
    }
}

/// Read up to `limit` messages
#[instrument(skip(state))]
async fn handle_get(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let params = GetParams::from_pairs(&pairs);
    match state.client.get(params.limit).await {
        Ok(messages) => {
            state.metrics.record_operation("get", Outcome::Success);
            state.metrics.record_got(messages.len());
            Ok(Json(messages))
        }
        Err(e) => {
            state.metrics.record_operation("get", outcome_of(&e));
            Err(ApiError::from_get(e))
        }
    }
}

/// Acknowledge immediately and look the message up in the background.
///
/// The lookup result is only logged; the caller has already been answered.
#[instrument(skip(state))]
async fn handle_get_by_id(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<AckResponse>, ApiError> {
    let params = GetByIdParams::from_pairs(&pairs);
    let id: MessageId = params
        .msgid
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| {
            state.metrics.record_operation("get_by_id", Outcome::Rejected);
            ApiError::MissingMessageId
        })?;

    let client = Arc::clone(&state.client);
    let metrics = Arc::clone(&state.metrics);
    tokio::spawn(async move {
        match client.get_by_id(&id).await {
            Ok(message) => {
                metrics.record_operation("get_by_id", Outcome::Success);
                metrics.record_got(1);
                info!(msgid = %id, bytes = message.body.len(), "Message data obtained ready to process");
            }
            Err(e) => {
                metrics.record_operation("get_by_id", outcome_of(&e));
                warn!(msgid = %id, error = %e, "Unable to obtain message");
            }
        }
    });

    Ok(Json(AckResponse::received()))
}

fn outcome_of(error: &QueueError) -> Outcome {
    if error.is_validation() {
        Outcome::Rejected
    } else {
        Outcome::Failed
    }
}

// ============================================================================
// Health and Observability Handlers
// ============================================================================

/// Report connection state; `degraded` once the queue client has been closed
#[instrument(skip(state))]
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.client.is_closed() {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        connection: state.client.connection_state(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.render().map_err(|e| {
        error!(error = %e, "Failed to render metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
