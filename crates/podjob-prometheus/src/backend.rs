use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use podjob_core::{LaunchOutcome, MetricsBackend};

const NAMESPACE: &str = "podjob";

/// Prometheus metrics for job launches.
///
/// Label values are bounded: `runner` is the configured runner name, `outcome` one of
/// `success|failure|timeout`, `error_kind` one of the runner error kind labels and
/// `operation` either `delete` or `sweep`.
#[derive(Clone)]
pub struct PrometheusMetrics {
    launches_started: CounterVec,
    launches_completed: CounterVec,
    launch_duration: HistogramVec,
    launch_errors: CounterVec,
    cleanup_errors: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register all metrics in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let launches_started = CounterVec::new(
            Opts::new("launches_started_total", "Jobs submitted by launch calls")
                .namespace(NAMESPACE),
            &["runner"],
        )?;
        registry.register(Box::new(launches_started.clone()))?;

        let launches_completed = CounterVec::new(
            Opts::new("launches_completed_total", "Launch calls that resolved")
                .namespace(NAMESPACE),
            &["runner", "outcome"],
        )?;
        registry.register(Box::new(launches_completed.clone()))?;

        // Jobs include scheduling and image pulls, hence the long tail.
        let launch_duration = HistogramVec::new(
            HistogramOpts::new("launch_duration_seconds", "Time from submission to resolution")
                .namespace(NAMESPACE)
                .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
            &["runner"],
        )?;
        registry.register(Box::new(launch_duration.clone()))?;

        let launch_errors = CounterVec::new(
            Opts::new("launch_errors_total", "Failed launch calls by error kind")
                .namespace(NAMESPACE),
            &["runner", "error_kind"],
        )?;
        registry.register(Box::new(launch_errors.clone()))?;

        let cleanup_errors = CounterVec::new(
            Opts::new("cleanup_errors_total", "Swallowed job deletion failures")
                .namespace(NAMESPACE),
            &["runner", "operation"],
        )?;
        registry.register(Box::new(cleanup_errors.clone()))?;

        Ok(Self {
            launches_started,
            launches_completed,
            launch_duration,
            launch_errors,
            cleanup_errors,
            registry,
        })
    }

    /// Register all metrics in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every registered metric in the text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_launch_started(&self, runner: &str) {
        self.launches_started.with_label_values(&[runner]).inc();
    }

    fn record_launch_completed(&self, runner: &str, outcome: LaunchOutcome, duration_ms: u64) {
        self.launches_completed
            .with_label_values(&[runner, outcome.as_label()])
            .inc();
        self.launch_duration
            .with_label_values(&[runner])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_launch_failed(&self, runner: &str, error_kind: &str) {
        self.launch_errors
            .with_label_values(&[runner, error_kind])
            .inc();
    }

    fn record_cleanup_error(&self, runner: &str, operation: &str) {
        self.cleanup_errors
            .with_label_values(&[runner, operation])
            .inc();
    }
}
