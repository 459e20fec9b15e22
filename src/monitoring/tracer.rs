/*!
 * Structured Tracing
 * Subscriber setup for the registry, reconciler and completion waits
 */

use std::time::Instant;

use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Environment toggle for JSON output
pub const TRACE_JSON_ENV: &str = "DRIVEHUB_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - DRIVEHUB_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns `false` when a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
    installed
}

/// Timed span around one drive operation
///
/// Logs a warning on drop when the operation took longer than `slow_after_ms`.
pub struct OperationSpan {
    span: Span,
    start: Instant,
    trace_id: String,
    slow_after_ms: u128,
}

impl OperationSpan {
    pub fn new(operation: &str, slow_after_ms: u128) -> Self {
        let trace_id = Uuid::new_v4().to_string();
        let span = span!(
            Level::DEBUG,
            "operation",
            trace_id = %trace_id,
            operation = operation,
            duration_ms = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            trace_id,
            slow_after_ms,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_millis();
        let _entered = self.span.enter();
        self.span.record("duration_ms", elapsed);
        if elapsed > self.slow_after_ms {
            warn!(trace_id = %self.trace_id, duration_ms = elapsed, slow = true, "slow operation detected");
        } else {
            debug!(trace_id = %self.trace_id, duration_ms = elapsed, "operation completed");
        }
    }
}

#[inline]
pub fn span_operation(name: &str, slow_after_ms: u128) -> OperationSpan {
    OperationSpan::new(name, slow_after_ms)
}
