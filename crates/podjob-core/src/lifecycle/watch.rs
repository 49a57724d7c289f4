use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use podjob_model::JobHandle;

use crate::{
    cluster::{ClusterApi, Subscription},
    lifecycle::{LifecycleMachine, Resolver, Step},
    retriever::ResultRetriever,
};

/// Drive `machine` with the events of `subscription` until it resolves.
///
/// Writes the outcome to `resolver` at most once. Stops early, without resolving,
/// when `cancel` fires. The subscription is released on every exit path.
pub async fn watch_job<C>(
    cluster: Arc<C>,
    handle: JobHandle,
    mut subscription: Subscription,
    retriever: ResultRetriever,
    mut machine: LifecycleMachine,
    mut resolver: Resolver,
    cancel: CancellationToken,
) where
    C: ClusterApi + ?Sized,
{
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(job = %handle, "watch cancelled before resolution");
                break;
            }
            item = subscription.next() => item,
        };

        match item {
            Some(Ok(event)) => {
                trace!(job = %handle, %event, "lifecycle event received");
                match machine.observe(&event) {
                    Step::Wait | Step::Ignore => continue,
                    Step::Resolve(outcome) => {
                        resolver.resolve(outcome);
                        break;
                    }
                    Step::Collect { exit_code } => {
                        let artifact = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                debug!(job = %handle, "watch cancelled while reading result");
                                break;
                            }
                            read = retriever.read(cluster.as_ref(), &handle) => read,
                        };
                        resolver.resolve(machine.collect(exit_code, artifact));
                        break;
                    }
                }
            }
            Some(Err(cause)) => {
                debug!(job = %handle, error = %cause, "event stream failed");
                if let Some(outcome) = machine.close(Some(cause)) {
                    resolver.resolve(outcome);
                }
                break;
            }
            None => {
                if let Some(outcome) = machine.close(None) {
                    resolver.resolve(outcome);
                }
                break;
            }
        }
    }
    subscription.release();
}
