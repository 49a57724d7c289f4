//! Runner abstraction: the capability set every execution backend offers.
//!
//! [`JobRunner`] is the container-orchestrator variant; other backends implement
//! [`Runner`] the same way and callers stay unaware of which one they hold.
mod id;
pub use id::{make_job_name, new_runner_id};

mod job;
pub use job::JobRunner;

use async_trait::async_trait;

use crate::error::RunnerError;

/// Executes functions somewhere else and brings their result back.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Runner name used in logs, errors and metrics.
    fn name(&self) -> &str;

    /// Run `function` with `payload` and return its result.
    async fn launch(&self, function: &str, payload: &str) -> Result<String, RunnerError>;

    /// Release everything the runner holds. Idempotent.
    async fn close(&self);
}
