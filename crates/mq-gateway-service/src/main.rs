//! # MQ Gateway Service
//!
//! Binary entry point for the MQ gateway HTTP service.
//!
//! This executable:
//! - Loads configuration from files and the environment
//! - Initializes structured logging
//! - Creates the queue client for the configured backend
//! - Starts the HTTP server from mq-gateway-api and serves until a
//!   termination signal has been handled
//!
//! Exit codes: 0 after an orderly shutdown, 1 when the listen address cannot
//! be bound, 2 when the server fails, 3 for configuration errors.

use anyhow::Context;
use mq_gateway_api::{start_server, LoggingConfig, ServiceConfig};
use mq_runtime::{QueueClient, QueueClientFactory};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

const CONFIGURATION_EXIT_CODE: i32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Logging depends on the configured level, so a load failure is reported
    // through a subscriber built from the defaults.
    // -------------------------------------------------------------------------
    let service_config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!(error = %e, "Service configuration is invalid; aborting");
            std::process::exit(CONFIGURATION_EXIT_CODE);
        }
    };

    init_tracing(&service_config.logging);
    info!(
        queue = %service_config.queue.queue_name,
        backend = ?service_config.queue.backend.kind(),
        consumption = ?service_config.queue.consumption,
        "Starting MQ gateway"
    );

    let client: Arc<dyn QueueClient> =
        match QueueClientFactory::create_client(service_config.queue.clone())
            .context("Failed to create queue client")
        {
            Ok(client) => Arc::from(client),
            Err(e) => {
                error!(error = ?e, "Queue client configuration is invalid; aborting");
                std::process::exit(CONFIGURATION_EXIT_CODE);
            }
        };

    if let Err(e) = start_server(service_config, client).await {
        error!(error = %e, "Server stopped with an error");
        std::process::exit(e.exit_code());
    }

    info!("MQ gateway stopped");
    Ok(())
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Installing twice is
/// ignored.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging was already initialized: {}", e);
    }
}

/// Filter directives applying `level` to the gateway crates
fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    format!(
        "mq_gateway={level},mq_gateway_api={level},mq_runtime={level},tower_http={level}",
        level = level
    )
}
