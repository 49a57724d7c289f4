//! Prometheus backend for podjob runner metrics.
//!
//! [`PrometheusMetrics`] implements [`podjob_core::MetricsBackend`]; inject it with
//! [`podjob_core::JobRunner::with_metrics`] and expose [`PrometheusMetrics::gather`]
//! (or [`PrometheusMetrics::encode_text`]) wherever the process serves metrics.
//!
//! ## Metrics
//! - `podjob_launches_started_total{runner}` - Counter
//! - `podjob_launches_completed_total{runner, outcome}` - Counter
//! - `podjob_launch_duration_seconds{runner}` - Histogram
//! - `podjob_launch_errors_total{runner, error_kind}` - Counter
//! - `podjob_cleanup_errors_total{runner, operation}` - Counter
mod backend;

pub use backend::PrometheusMetrics;
