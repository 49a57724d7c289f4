//! Job deletion: per-launch best-effort delete and the label-scoped orphan sweep.
use std::sync::Arc;

use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

use podjob_model::{JobHandle, Labels};

use crate::{cluster::ClusterApi, metrics::MetricsHandle};

/// Deletes jobs on behalf of one runner. Failures are logged and counted, never returned.
pub struct CleanupManager<C: ?Sized> {
    cluster: Arc<C>,
    runner: String,
    grace_seconds: u32,
    metrics: MetricsHandle,
}

impl<C: ?Sized> Clone for CleanupManager<C> {
    fn clone(&self) -> Self {
        Self {
            cluster: Arc::clone(&self.cluster),
            runner: self.runner.clone(),
            grace_seconds: self.grace_seconds,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<C> CleanupManager<C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(
        cluster: Arc<C>,
        runner: impl Into<String>,
        grace_seconds: u32,
        metrics: MetricsHandle,
    ) -> Self {
        Self {
            cluster,
            runner: runner.into(),
            grace_seconds,
            metrics,
        }
    }

    /// Replace the metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Delete one job. Returns `false` if the delete failed (already logged).
    pub async fn delete(&self, handle: &JobHandle) -> bool {
        match self.cluster.delete_job(handle, self.grace_seconds).await {
            Ok(()) => {
                debug!(runner = %self.runner, job = %handle, "job deleted");
                true
            }
            Err(e) => {
                warn!(runner = %self.runner, job = %handle, error = %e, "failed to delete job");
                self.metrics.record_cleanup_error(&self.runner, "delete");
                false
            }
        }
    }

    /// Delete one job on a background task, without blocking the caller.
    pub fn delete_in_background(&self, handle: JobHandle) -> JoinHandle<bool> {
        let this = self.clone();
        tokio::spawn(async move { this.delete(&handle).await })
    }

    /// Delete every job carrying `labels`. Safe to call when nothing matches.
    pub async fn sweep(&self, labels: &Labels) -> bool {
        debug!(runner = %self.runner, selector = %labels.to_selector(), "deleting potentially dangling jobs");
        match self
            .cluster
            .delete_jobs_by_label(labels, self.grace_seconds)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(runner = %self.runner, error = %e, "orphan sweep failed");
                self.metrics.record_cleanup_error(&self.runner, "sweep");
                false
            }
        }
    }

    /// Guard that deletes `handle` in the background when dropped.
    ///
    /// Fires on every exit path of the scope holding it, including cancellation
    /// of the enclosing future.
    pub fn guard(&self, handle: JobHandle) -> DeleteGuard<C> {
        DeleteGuard {
            cleanup: self.clone(),
            handle: Some(handle),
        }
    }
}

/// Scope guard returned by [`CleanupManager::guard`].
pub struct DeleteGuard<C>
where
    C: ClusterApi + ?Sized,
{
    cleanup: CleanupManager<C>,
    handle: Option<JobHandle>,
}

impl<C> Drop for DeleteGuard<C>
where
    C: ClusterApi + ?Sized,
{
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if Handle::try_current().is_ok() {
            self.cleanup.delete_in_background(handle);
        } else {
            warn!(job = %handle, "no async runtime available, job left for the orphan sweep");
        }
    }
}
