use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, WatchEvent, WatchParams};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use podjob_core::{ClusterError, EventSink};

use crate::convert::pod_event;

/// Resource version that starts a watch from the current state.
const INITIAL_VERSION: &str = "0";

/// `410 Gone` for a version other than the initial one; watching from the initial
/// version cannot expire.
fn is_expired(version: &str, code: u16) -> bool {
    code == 410 && version != INITIAL_VERSION
}

/// Push the lifecycle of pod `name` into `sink` until released.
///
/// A watch the server ends normally (server-side timeout) is re-established from
/// the last seen resource version. An expired version (`410 Gone`) restarts the
/// watch from the current state. Other error events and transport failures close
/// the stream with that error as cause.
pub(crate) async fn pump_pod_events(
    api: Api<Pod>,
    name: String,
    sink: EventSink,
    shutdown: CancellationToken,
) {
    let params = WatchParams::default().fields(&format!("metadata.name={name}"));
    let mut version = INITIAL_VERSION.to_string();

    loop {
        let since = version.clone();
        let started = tokio::select! {
            _ = sink.released() => return,
            _ = shutdown.cancelled() => return,
            started = api.watch(&params, &since) => started,
        };
        let mut stream = match started {
            Ok(stream) => stream.boxed(),
            Err(kube::Error::Api(e)) if is_expired(&since, e.code) => {
                debug!(pod = %name, resource_version = %since, "resource version expired, re-watching");
                version = INITIAL_VERSION.to_string();
                continue;
            }
            Err(e) => {
                warn!(pod = %name, error = %e, "failed to start pod watch");
                sink.send(Err(ClusterError::Watch(e.to_string()))).await;
                return;
            }
        };
        debug!(pod = %name, resource_version = %since, "pod watch started");

        loop {
            let next = tokio::select! {
                _ = sink.released() => return,
                _ = shutdown.cancelled() => return,
                next = stream.try_next() => next,
            };
            match next {
                Ok(Some(WatchEvent::Added(pod) | WatchEvent::Modified(pod))) => {
                    if let Some(rv) = &pod.metadata.resource_version {
                        version.clone_from(rv);
                    }
                    let event = pod_event(&pod);
                    trace!(pod = %name, %event, "pod changed");
                    if !sink.send(Ok(event)).await {
                        return;
                    }
                }
                Ok(Some(WatchEvent::Deleted(pod))) => {
                    debug!(pod = %name, "pod deleted");
                    sink.send(Ok(pod_event(&pod).into_deleted())).await;
                    return;
                }
                Ok(Some(WatchEvent::Bookmark(bookmark))) => {
                    version = bookmark.metadata.resource_version;
                }
                Ok(Some(WatchEvent::Error(e))) if is_expired(&since, e.code) => {
                    debug!(pod = %name, resource_version = %since, "resource version expired, re-watching");
                    version = INITIAL_VERSION.to_string();
                    break;
                }
                Ok(Some(WatchEvent::Error(e))) => {
                    warn!(pod = %name, code = e.code, reason = %e.reason, "pod watch error");
                    sink.send(Err(ClusterError::Watch(format!(
                        "{} ({}): {}",
                        e.reason, e.code, e.message
                    ))))
                    .await;
                    return;
                }
                Ok(None) => {
                    debug!(pod = %name, "pod watch ended by server, re-watching");
                    break;
                }
                Err(e) => {
                    warn!(pod = %name, error = %e, "pod watch failed");
                    sink.send(Err(ClusterError::Watch(e.to_string()))).await;
                    return;
                }
            }
        }
    }
}
