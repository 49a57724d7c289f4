//! Result artifact retrieval and exit-status classification.
use tracing::debug;

use podjob_model::{FailurePayload, JobHandle};

use crate::{
    cluster::{ClusterApi, ClusterError},
    error::{ErrorKind, RunnerError},
    outcome::Outcome,
};

/// Reads the result artifact of a terminated job through its sidecar container.
#[derive(Debug, Clone)]
pub struct ResultRetriever {
    container: String,
    path: String,
}

impl ResultRetriever {
    pub fn new(container: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            path: path.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Read the artifact. Only meaningful once the target container terminated.
    pub async fn read<C>(&self, cluster: &C, handle: &JobHandle) -> Result<Vec<u8>, ClusterError>
    where
        C: ClusterApi + ?Sized,
    {
        debug!(job = %handle, container = %self.container, path = %self.path, "reading result artifact");
        cluster.read_file(handle, &self.container, &self.path).await
    }
}

/// Map the target's exit code and the artifact read into an [`Outcome`].
///
/// | exit | artifact                    | outcome              |
/// |------|-----------------------------|----------------------|
/// | 0    | read                        | `Success`            |
/// | 0    | read failed                 | `ResultUnavailable`  |
/// | != 0 | structured failure payload  | `RemoteFailure`      |
/// | != 0 | anything else               | `NonZeroExit`        |
/// | != 0 | read failed                 | `NonZeroExit` + cause|
pub fn classify_artifact(
    runner: &str,
    job: &str,
    exit_code: i32,
    artifact: Result<Vec<u8>, ClusterError>,
) -> Outcome {
    let err = match (exit_code, artifact) {
        (0, Ok(bytes)) => return Outcome::Success(bytes),
        (0, Err(cause)) => RunnerError::new(
            ErrorKind::ResultUnavailable,
            runner,
            format!("job '{job}' succeeded but its result could not be read"),
        )
        .with_cause(cause),
        (code, Ok(bytes)) => match FailurePayload::parse(&bytes) {
            Some(payload) => RunnerError::new(ErrorKind::RemoteFailure, runner, payload.message)
                .with_remote_trace(payload.stack_trace),
            None => RunnerError::new(
                ErrorKind::NonZeroExit,
                runner,
                format!("exit status {code}"),
            ),
        },
        (code, Err(cause)) => RunnerError::new(
            ErrorKind::NonZeroExit,
            runner,
            format!("exit status {code} (result unreadable)"),
        )
        .with_cause(cause),
    };
    Outcome::Failure(err)
}
