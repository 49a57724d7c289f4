//! Deadline around the wait for a job's outcome.
use std::time::Duration;

use tracing::warn;

use crate::{
    error::{ErrorKind, RunnerError},
    lifecycle::Resolution,
    outcome::Outcome,
};

/// Wait for `resolution`, bounded by `timeout` when set.
///
/// Only the wait is bounded: on expiry this returns a `Timeout` failure and drops
/// the resolution. Releasing the watch and deleting the job belong to the caller.
pub async fn await_outcome(
    runner: &str,
    resolution: Resolution,
    timeout: Option<Duration>,
) -> Outcome {
    let wait = async {
        match resolution.wait().await {
            Some(outcome) => outcome,
            None => Outcome::Failure(RunnerError::new(
                ErrorKind::StreamClosed,
                runner,
                "lifecycle watch ended without resolving the job",
            )),
        }
    };

    let Some(limit) = timeout else {
        return wait.await;
    };
    match tokio::time::timeout(limit, wait).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(runner, timeout_ms = limit.as_millis() as u64, "job did not finish in time");
            Outcome::Failure(RunnerError::new(
                ErrorKind::Timeout,
                runner,
                format!("no terminal job state within {} ms", limit.as_millis()),
            ))
        }
    }
}
