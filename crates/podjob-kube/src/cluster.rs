use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    Client, Config,
    api::{Api, DeleteParams, ListParams, PostParams},
    config::KubeConfigOptions,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use podjob_core::{ClusterApi, ClusterError, Subscription};
use podjob_model::{JobHandle, JobSpec, Labels};

use crate::{ClusterConfig, convert::pod_from_spec, exec::cat_file, watch::pump_pod_events};

/// Buffered events per subscription before the watch task waits for the consumer.
const EVENT_BUFFER: usize = 32;

/// Pods in one namespace of a Kubernetes cluster.
#[derive(Clone)]
pub struct KubeCluster {
    pods: Api<Pod>,
    namespace: String,
    shutdown: CancellationToken,
}

impl KubeCluster {
    /// Connect using the kubeconfig context from `config`, or the inferred
    /// in-cluster/kubeconfig settings when none is given.
    pub async fn connect(config: &ClusterConfig) -> Result<Self, ClusterError> {
        let kube_config = match &config.context {
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.clone()),
                    ..Default::default()
                };
                Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| ClusterError::Connect(e.to_string()))?
            }
            None => Config::infer()
                .await
                .map_err(|e| ClusterError::Connect(e.to_string()))?,
        };
        let client =
            Client::try_from(kube_config).map_err(|e| ClusterError::Connect(e.to_string()))?;

        info!(namespace = %config.namespace, context = ?config.context, "connected to cluster");
        Ok(Self::from_client(client, &config.namespace))
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client, namespace: &str) -> Self {
        Self {
            pods: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
            shutdown: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn submit_job(&self, spec: &JobSpec) -> Result<JobHandle, ClusterError> {
        let pod = pod_from_spec(spec, &self.namespace)?;
        let created = self
            .pods
            .create(&PostParams::default(), &pod)
            .await
            .map_err(api_error)?;

        let name = created.metadata.name.unwrap_or_else(|| spec.name().to_string());
        debug!(namespace = %self.namespace, pod = %name, "pod created");
        Ok(JobHandle::new(name, &self.namespace))
    }

    async fn delete_job(&self, handle: &JobHandle, grace_seconds: u32) -> Result<(), ClusterError> {
        match self
            .pods
            .delete(handle.name(), &delete_params(grace_seconds))
            .await
        {
            Ok(_) => {
                debug!(job = %handle, "pod deleted");
                Ok(())
            }
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(api_error(e)),
        }
    }

    async fn delete_jobs_by_label(
        &self,
        labels: &Labels,
        grace_seconds: u32,
    ) -> Result<(), ClusterError> {
        let selector = labels.to_selector();
        let list = ListParams::default().labels(&selector);
        match self
            .pods
            .delete_collection(&delete_params(grace_seconds), &list)
            .await
        {
            Ok(_) => {
                debug!(namespace = %self.namespace, %selector, "pods deleted by label");
                Ok(())
            }
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(api_error(e)),
        }
    }

    async fn subscribe(&self, handle: &JobHandle) -> Result<Subscription, ClusterError> {
        if self.shutdown.is_cancelled() {
            return Err(ClusterError::Watch("cluster handle is closed".into()));
        }
        let (sink, subscription) = Subscription::channel(EVENT_BUFFER);
        tokio::spawn(pump_pod_events(
            self.pods.clone(),
            handle.name().to_string(),
            sink,
            self.shutdown.child_token(),
        ));
        Ok(subscription)
    }

    async fn read_file(
        &self,
        handle: &JobHandle,
        container: &str,
        path: &str,
    ) -> Result<Vec<u8>, ClusterError> {
        cat_file(&self.pods, handle.name(), container, path).await
    }

    async fn close(&self) {
        self.shutdown.cancel();
        debug!(namespace = %self.namespace, "cluster handle closed");
    }
}

fn delete_params(grace_seconds: u32) -> DeleteParams {
    DeleteParams {
        grace_period_seconds: Some(grace_seconds),
        ..Default::default()
    }
}

fn is_not_found(e: &kube::Error) -> bool {
    matches!(e, kube::Error::Api(resp) if resp.code == 404)
}

fn api_error(e: kube::Error) -> ClusterError {
    ClusterError::Api(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_params_carry_grace_period() {
        assert_eq!(delete_params(0).grace_period_seconds, Some(0));
        assert_eq!(delete_params(30).grace_period_seconds, Some(30));
    }
}
