use std::sync::Arc;

use crate::{error::ErrorKind, outcome::Outcome};

/// Coarse launch result used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Success,
    Failure,
    Timeout,
}

impl LaunchOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            LaunchOutcome::Success => "success",
            LaunchOutcome::Failure => "failure",
            LaunchOutcome::Timeout => "timeout",
        }
    }
}

impl From<&Outcome> for LaunchOutcome {
    fn from(outcome: &Outcome) -> Self {
        match outcome.error_kind() {
            None => LaunchOutcome::Success,
            Some(ErrorKind::Timeout) => LaunchOutcome::Timeout,
            Some(_) => LaunchOutcome::Failure,
        }
    }
}

/// Backend metrics collection interface.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record that a launch built its job spec and is about to submit it.
    fn record_launch_started(&self, runner: &str);

    /// Record the end of a launch.
    ///
    /// # Arguments
    /// - `runner`: runner name
    /// - `outcome`: how the launch ended
    /// - `duration_ms`: time from submission to resolution
    fn record_launch_completed(&self, runner: &str, outcome: LaunchOutcome, duration_ms: u64);

    /// Record the error kind of a failed launch (`ErrorKind::as_label`).
    fn record_launch_failed(&self, runner: &str, error_kind: &str);

    /// Record a swallowed cleanup failure (`"delete"` or `"sweep"`).
    fn record_cleanup_error(&self, runner: &str, operation: &str);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
