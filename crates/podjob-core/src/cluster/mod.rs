//! Seam between the runner and the orchestrator.
//!
//! The orchestrator's control plane is consumed, never reimplemented: a backend
//! crate (e.g. `podjob-kube`) implements [`ClusterApi`] and the runner drives it.
mod error;
pub use error::ClusterError;

mod subscription;
pub use subscription::{EventItem, EventSink, Subscription};

use async_trait::async_trait;
use podjob_model::{JobHandle, JobSpec, Labels};

/// Minimal control-plane surface needed to run one job.
///
/// Implementations must be safe to share between concurrent launches.
#[async_trait]
pub trait ClusterApi: Send + Sync + 'static {
    /// Namespace every job of this cluster handle is created in.
    fn namespace(&self) -> &str;

    /// Create the job described by `spec`.
    async fn submit_job(&self, spec: &JobSpec) -> Result<JobHandle, ClusterError>;

    /// Delete one job. Deleting a job that no longer exists is not an error.
    async fn delete_job(&self, handle: &JobHandle, grace_seconds: u32) -> Result<(), ClusterError>;

    /// Delete every job carrying all of `labels`.
    async fn delete_jobs_by_label(
        &self,
        labels: &Labels,
        grace_seconds: u32,
    ) -> Result<(), ClusterError>;

    /// Start pushing lifecycle events of one job.
    async fn subscribe(&self, handle: &JobHandle) -> Result<Subscription, ClusterError>;

    /// Read a file from a container of the job.
    async fn read_file(
        &self,
        handle: &JobHandle,
        container: &str,
        path: &str,
    ) -> Result<Vec<u8>, ClusterError>;

    /// Release the underlying connection.
    async fn close(&self) {}
}
