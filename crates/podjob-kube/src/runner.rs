use std::sync::Arc;

use podjob_core::{ErrorKind, JobRunner, JobTemplate, RunnerError};
use podjob_model::{ModelResult, RunnerConfig};

use crate::{ClusterConfig, KubeCluster};

/// Pod template used when the runner configuration names none.
pub const DEFAULT_POD_TEMPLATE: &str = include_str!("../templates/pod.template.json");

pub fn default_template() -> ModelResult<JobTemplate> {
    JobTemplate::from_json(DEFAULT_POD_TEMPLATE)
}

/// Template from `config.template`, or the bundled one.
pub fn load_template(config: &RunnerConfig) -> ModelResult<JobTemplate> {
    match &config.template {
        Some(path) => JobTemplate::from_path(path),
        None => default_template(),
    }
}

/// Connect to the cluster and build a runner that owns the connection.
pub async fn kube_runner(
    name: &str,
    cluster: &ClusterConfig,
    config: RunnerConfig,
) -> Result<JobRunner<KubeCluster>, RunnerError> {
    let template = load_template(&config)
        .map_err(|e| RunnerError::new(ErrorKind::Config, name, e.to_string()).with_cause(e))?;
    let connection = KubeCluster::connect(cluster).await.map_err(|e| {
        RunnerError::new(ErrorKind::Infra, name, "cannot connect to cluster").with_cause(e)
    })?;

    Ok(JobRunner::new(name, Arc::new(connection), config, template)?.owning_cluster())
}
