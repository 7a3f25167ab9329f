//! Process lifecycle: termination signals and the shutdown routine.
//!
//! Every termination signal funnels into [`LifecycleController::shutdown`],
//! which runs queue cleanup at most once. Cleanup is bounded by a timeout and
//! its outcome is only logged; shutdown always proceeds.

use mq_runtime::{QueueClient, QueueError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

/// Signals that start the shutdown sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
    Hangup,
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Hangup => "SIGHUP",
        };
        write!(f, "{}", name)
    }
}

/// Result of a call to [`LifecycleController::shutdown`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Completed,
    CleanupFailed { message: String },
    TimedOut,
    /// Another call already ran (or is running) the shutdown routine
    AlreadyShuttingDown,
}

/// Owner of the single idempotent shutdown routine
pub struct LifecycleController {
    client: Arc<dyn QueueClient>,
    cleanup_timeout: Duration,
    shutting_down: AtomicBool,
}

impl LifecycleController {
    pub fn new(client: Arc<dyn QueueClient>, cleanup_timeout: Duration) -> Self {
        Self {
            client,
            cleanup_timeout,
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Run queue cleanup once; later calls return immediately
    pub async fn shutdown(&self, reason: &str) -> ShutdownOutcome {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            info!(reason, "Shutdown already in progress; ignoring");
            return ShutdownOutcome::AlreadyShuttingDown;
        }

        info!(reason, "Application is about to die, processing tidy-up");

        let outcome = match tokio::time::timeout(self.cleanup_timeout, self.client.cleanup()).await
        {
            Ok(Ok(())) => ShutdownOutcome::Completed,
            Ok(Err(QueueError::Timeout { .. })) | Err(_) => ShutdownOutcome::TimedOut,
            Ok(Err(e)) => ShutdownOutcome::CleanupFailed {
                message: e.to_string(),
            },
        };

        match &outcome {
            ShutdownOutcome::Completed => info!("Cleanup completed successfully"),
            ShutdownOutcome::CleanupFailed { message } => {
                warn!(error = %message, "Cleanup failed; continuing shutdown")
            }
            ShutdownOutcome::TimedOut => warn!(
                timeout = ?self.cleanup_timeout,
                "Cleanup timed out; continuing shutdown"
            ),
            ShutdownOutcome::AlreadyShuttingDown => {}
        }

        outcome
    }
}

/// Listener for SIGINT, SIGTERM and SIGHUP (Ctrl-C only on non-Unix targets)
pub struct TerminationSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
}

impl TerminationSignals {
    /// Install the signal handlers
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Install the signal handlers
    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next termination signal
    #[cfg(unix)]
    pub async fn recv(&mut self) -> std::io::Result<TerminationSignal> {
        let received = tokio::select! {
            _ = self.interrupt.recv() => TerminationSignal::Interrupt,
            _ = self.terminate.recv() => TerminationSignal::Terminate,
            _ = self.hangup.recv() => TerminationSignal::Hangup,
        };

        Ok(received)
    }

    /// Wait for the next termination signal
    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> std::io::Result<TerminationSignal> {
        tokio::signal::ctrl_c().await?;
        Ok(TerminationSignal::Interrupt)
    }
}

/// Wait for the first SIGINT, SIGTERM or SIGHUP
pub async fn wait_for_termination_signal() -> std::io::Result<TerminationSignal> {
    TerminationSignals::install()?.recv().await
}

/// Forward every termination signal into `sender` until the receiver is dropped
pub async fn forward_termination_signals(sender: tokio::sync::mpsc::Sender<TerminationSignal>) {
    let mut signals = match TerminationSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            warn!(error = %e, "Failed to install termination signal handlers");
            return;
        }
    };

    loop {
        match signals.recv().await {
            Ok(signal) => {
                if sender.send(signal).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed while waiting for termination signals");
                return;
            }
        }
    }
}
