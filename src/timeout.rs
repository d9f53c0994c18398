//! Timeout and cancellation utilities for bounded scan operations.
//!
//! External engines are the only calls that can block for long, so each one is
//! wrapped with its own deadline and raced against the scan-level [`CancelToken`].

use crate::error::{Result, ScanError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default timeout duration in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300; // 5 minutes

/// Fast operation timeout in seconds (for simple operations)
pub const FAST_TIMEOUT_SECONDS: u64 = 10;

/// Timeout configuration for a bounded operation
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Maximum duration for the operation
    pub duration: Duration,
    /// Whether to log timeout errors
    pub log_warnings: bool,
    /// Operation name for logging
    pub operation_name: String,
}

impl TimeoutConfig {
    /// Create a new timeout configuration
    pub fn new(seconds: u64, operation: impl Into<String>) -> Self {
        Self::with_duration(Duration::from_secs(seconds), operation)
    }

    /// Create a timeout configuration from an exact duration
    pub fn with_duration(duration: Duration, operation: impl Into<String>) -> Self {
        Self {
            duration,
            log_warnings: true,
            operation_name: operation.into(),
        }
    }

    /// Create a fast timeout configuration (10 seconds)
    pub fn fast(operation: impl Into<String>) -> Self {
        Self::new(FAST_TIMEOUT_SECONDS, operation)
    }

    /// Create a default timeout configuration (5 minutes)
    pub fn default_timeout(operation: impl Into<String>) -> Self {
        Self::new(DEFAULT_TIMEOUT_SECONDS, operation)
    }
}

/// Execute an async operation with a timeout
pub async fn with_timeout<T, F>(config: TimeoutConfig, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    debug!(
        "Starting operation '{}' with timeout of {:?}",
        config.operation_name, config.duration
    );

    match timeout(config.duration, future).await {
        Ok(result) => result,
        Err(_) => {
            if config.log_warnings {
                warn!(
                    "Operation '{}' timed out after {:?}",
                    config.operation_name, config.duration
                );
            }

            Err(ScanError::Timeout {
                operation: config.operation_name,
                seconds: config.duration.as_secs(),
            })
        }
    }
}

/// Scan-level cancellation signal shared by every in-flight bounded operation.
///
/// Clones observe the same flag. Cancelling drops the futures racing against
/// [`CancelToken::cancelled`], which kills any engine process spawned with
/// `kill_on_drop`.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Signal cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once the token has been cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.receiver.clone();
        // The sender lives as long as any clone of the token, so `changed`
        // only errors if every token has been dropped.
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Run `future` under `config`, failing early if the token is cancelled.
    pub async fn run<T, F>(&self, config: TimeoutConfig, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let name = config.operation_name.clone();
        tokio::select! {
            res = with_timeout(config, future) => res,
            _ = self.cancelled() => {
                debug!("Operation '{}' cancelled", name);
                Err(ScanError::Cancelled(name))
            }
        }
    }
}
