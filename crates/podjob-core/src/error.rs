use std::fmt;

use thiserror::Error;

/// Boxed upstream error carried as the cause of a [`RunnerError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of every way a launch can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Template or configuration is unusable; nothing was submitted.
    Config,
    /// The orchestrator reported a condition the job can never recover from.
    Infra,
    /// The event stream ended before the job reached a terminal state.
    StreamClosed,
    /// The target container exited non-zero without a structured failure payload.
    NonZeroExit,
    /// The target container exited non-zero and described the failure itself.
    RemoteFailure,
    /// The job succeeded but its result artifact could not be obtained.
    ResultUnavailable,
    /// The launch deadline elapsed first.
    Timeout,
}

impl ErrorKind {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Infra => "infra",
            ErrorKind::StreamClosed => "stream_closed",
            ErrorKind::NonZeroExit => "non_zero_exit",
            ErrorKind::RemoteFailure => "remote_failure",
            ErrorKind::ResultUnavailable => "result_unavailable",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Config => "configuration error",
            ErrorKind::Infra => "infrastructure error",
            ErrorKind::StreamClosed => "event stream closed",
            ErrorKind::NonZeroExit => "non-zero exit",
            ErrorKind::RemoteFailure => "remote failure",
            ErrorKind::ResultUnavailable => "result unavailable",
            ErrorKind::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Error returned by a runner for any launch that did not succeed.
///
/// Always names the runner; optionally carries the upstream cause and the
/// stack trace the job reported about itself.
#[derive(Debug, Error)]
#[error("{kind} in runner '{runner}': {message}")]
pub struct RunnerError {
    kind: ErrorKind,
    runner: String,
    message: String,
    #[source]
    cause: Option<BoxError>,
    remote_trace: Option<String>,
}

impl RunnerError {
    pub fn new(kind: ErrorKind, runner: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            runner: runner.into(),
            message: message.into(),
            cause: None,
            remote_trace: None,
        }
    }

    /// Attach the upstream error that led to this one.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Attach the stack trace reported by the job.
    pub fn with_remote_trace(mut self, trace: Option<String>) -> Self {
        self.remote_trace = trace;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn runner(&self) -> &str {
        &self.runner
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn remote_trace(&self) -> Option<&str> {
        self.remote_trace.as_deref()
    }
}
