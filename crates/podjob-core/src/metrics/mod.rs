//! Metrics collection abstraction for podjob runners.
//!
//! Backends (prometheus, statsd, ...) implement [`MetricsBackend`] and are injected
//! with [`crate::JobRunner::with_metrics`].
mod backend;
pub use backend::{LaunchOutcome, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
