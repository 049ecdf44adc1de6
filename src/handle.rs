//! Exception-safe tool invocation.
//!
//! [`SafeToolHandle`] composes over a [`ToolHandle`] so that tool
//! invocation never surfaces an `Err`: every failure, including bugs in
//! provider adapters, becomes a [`ToolCallOutcome`] the caller can branch
//! on. Setup failures (connecting, binding) still propagate as errors
//! before a safe handle exists.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::core::{connection::ToolHandle, metrics::HubMetrics};

/// Discriminated result of a safe tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCallOutcome {
    /// Normalized tool output; `Value::Null` when the call failed locally.
    pub output: Value,
    pub is_error: bool,
    /// Error message when `is_error` is set.
    pub error: Option<String>,
    pub duration: std::time::Duration,
}

impl ToolCallOutcome {
    fn failure(message: String, duration: std::time::Duration) -> Self {
        Self {
            output: Value::Null,
            is_error: true,
            error: Some(message),
            duration,
        }
    }
}

pub struct SafeToolHandle {
    inner: ToolHandle,
    in_flight: Arc<AtomicUsize>,
    metrics: Option<Arc<HubMetrics>>,
}

impl SafeToolHandle {
    pub fn new(inner: ToolHandle) -> Self {
        Self {
            inner,
            in_flight: Arc::new(AtomicUsize::new(0)),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<HubMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn tool_name(&self) -> &str {
        self.inner.tool_name()
    }

    pub fn server_id(&self) -> &str {
        self.inner.server_id()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Invoke the tool. Never returns `Err`; inspect
    /// [`ToolCallOutcome::is_error`].
    pub async fn call(&self, args: Value) -> ToolCallOutcome {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = scopeguard::guard(Arc::clone(&self.in_flight), |count| {
            count.fetch_sub(1, Ordering::SeqCst);
        });

        if let Some(metrics) = &self.metrics {
            metrics.record_call_start();
        }
        let started = Instant::now();

        let result = self.inner.call(args).await;
        let duration = started.elapsed();

        let outcome = match result {
            Ok(output) => ToolCallOutcome {
                error: output
                    .is_error
                    .then(|| "tool reported an error result".to_string()),
                is_error: output.is_error,
                output: output.content,
                duration,
            },
            Err(e) => {
                debug!(
                    "Tool '{}' call failed: {}",
                    self.inner.tool_name(),
                    e
                );
                ToolCallOutcome::failure(e.to_string(), duration)
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_call_end(
                self.inner.tool_name(),
                !outcome.is_error,
                duration.as_millis() as u64,
            );
        }

        outcome
    }

    /// Synchronous variant; unsupported by every provider, so this always
    /// yields an error outcome.
    pub fn call_sync(&self, args: Value) -> ToolCallOutcome {
        match self.inner.call_sync(args) {
            Ok(output) => ToolCallOutcome {
                error: None,
                is_error: output.is_error,
                output: output.content,
                duration: std::time::Duration::ZERO,
            },
            Err(e) => ToolCallOutcome::failure(e.to_string(), std::time::Duration::ZERO),
        }
    }
}
