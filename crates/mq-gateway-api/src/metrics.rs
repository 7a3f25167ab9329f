//! Metrics collection for the API service.
//!
//! Metrics live in a registry owned by [`ServiceMetrics`] rather than the
//! process-global default registry, so several instances can coexist in one
//! process.

use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;

/// Result label for a queue operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Rejected,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// Service metrics for observability
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,

    /// Operations by name and outcome
    pub operations_total: IntCounterVec,

    /// Messages written to the queue
    pub messages_put_total: IntCounter,

    /// Messages read from the queue
    pub messages_got_total: IntCounter,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("mq_operations_total", "Queue operations by outcome"),
            &["operation", "outcome"],
        )?;
        let messages_put_total =
            IntCounter::new("mq_messages_put_total", "Messages written to the queue")?;
        let messages_got_total =
            IntCounter::new("mq_messages_got_total", "Messages read from the queue")?;

        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(messages_put_total.clone()))?;
        registry.register(Box::new(messages_got_total.clone()))?;

        Ok(Arc::new(Self {
            registry,
            operations_total,
            messages_put_total,
            messages_got_total,
        }))
    }

    pub fn record_operation(&self, operation: &str, outcome: Outcome) {
        self.operations_total
            .with_label_values(&[operation, outcome.as_str()])
            .inc();
    }

    pub fn record_put(&self, count: usize) {
        self.messages_put_total.inc_by(count as u64);
    }

    pub fn record_got(&self, count: usize) {
        self.messages_got_total.inc_by(count as u64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
