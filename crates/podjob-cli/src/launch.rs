use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use podjob_core::{Runner, RunnerError};
use podjob_prometheus::PrometheusMetrics;

use crate::config::AppConfig;

const RUNNER_NAME: &str = "kubernetes";

/// Launch one call, print the result, and always close the runner.
///
/// Ctrl-C abandons the launch; closing the runner then sweeps the interrupted pod.
pub async fn run(cfg: AppConfig, function: &str, payload: &str, dump_metrics: bool) -> Result<()> {
    let metrics = PrometheusMetrics::new().context("cannot register metrics")?;
    let runner = podjob_kube::kube_runner(RUNNER_NAME, &cfg.cluster, cfg.runner)
        .await?
        .with_metrics(Arc::new(metrics.clone()));

    let result = tokio::select! {
        result = runner.launch(function, payload) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            warn!(function, "interrupted, abandoning launch");
            None
        }
    };
    runner.close().await;

    if dump_metrics {
        eprint!("{}", metrics.encode_text().context("cannot encode metrics")?);
    }

    match result {
        Some(Ok(output)) => {
            info!(function, "launch finished");
            println!("{output}");
            Ok(())
        }
        Some(Err(err)) => Err(report(err)),
        None => anyhow::bail!("launch of '{function}' interrupted"),
    }
}

fn report(err: RunnerError) -> anyhow::Error {
    if let Some(trace) = err.remote_trace() {
        eprintln!("remote trace:\n{trace}");
    }
    anyhow::Error::new(err)
}
