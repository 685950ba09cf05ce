/*!
 * Monitoring
 * Structured tracing and loader counters
 */

pub mod stats;
pub mod tracer;

pub use stats::{LoaderStats, LoaderStatsSnapshot};
pub use tracer::{generate_trace_id, init_tracing, log_startup, StepSpan, TRACE_JSON_ENV};
