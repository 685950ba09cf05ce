/*!
 * Structured Tracing
 * Subscriber setup and per-step spans using the tracing crate
 *
 * All output goes to stderr; stdout belongs to the console protocol.
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Environment variable enabling JSON log output
pub const TRACE_JSON_ENV: &str = "DYN_INSPECTOR_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - DYN_INSPECTOR_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!(json = use_json, "structured tracing initialized");
    }
}

/// Generate a unique trace ID for correlating the steps of one run
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one step of the inspector sequence
pub struct StepSpan {
    span: tracing::Span,
    start: Instant,
    step: &'static str,
    trace_id: String,
}

impl StepSpan {
    pub fn new(step: &'static str, trace_id: &str) -> Self {
        let span = span!(
            Level::DEBUG,
            "step",
            trace_id = %trace_id,
            step = step,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        let _entered = span.enter();
        debug!(step = step, "step started");
        drop(_entered);

        Self {
            span,
            start: Instant::now(),
            step,
            trace_id: trace_id.to_string(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record the outcome of a step result
    pub fn record_outcome<T, E: std::fmt::Display>(&self, result: &Result<T, E>) {
        match result {
            Ok(_) => {
                self.span.record("result", "success");
            }
            Err(e) => {
                self.span.record("result", "error");
                self.span.record("error", e.to_string().as_str());
            }
        }
    }
}

impl Drop for StepSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration.as_millis() > 100 {
            // Library initialisers or the entry point itself can be slow
            warn!(
                trace_id = %self.trace_id,
                step = self.step,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow step detected"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                step = self.step,
                duration_us = duration.as_micros() as u64,
                "step completed"
            );
        }
    }
}

/// Log the binary version at startup
pub fn log_startup() {
    info!(version = env!("CARGO_PKG_VERSION"), "dyn-inspector starting");
}
