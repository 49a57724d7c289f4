use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use podjob_model::{
    JobHandle, JobSpec, LABEL_OWNER, LABEL_RUNNER_ID, Labels, OWNER_VALUE, RunnerConfig,
};

use crate::{
    cleanup::CleanupManager,
    cluster::ClusterApi,
    error::{ErrorKind, RunnerError},
    lifecycle::{LifecycleMachine, resolution, watch_job},
    metrics::{LaunchOutcome, MetricsHandle, noop_metrics},
    outcome::Outcome,
    retriever::ResultRetriever,
    runner::{Runner, new_runner_id},
    template::{JobSpecBuilder, JobTemplate, SIDECAR_CONTAINER},
    timeout::await_outcome,
};

/// Runs each launch as one ephemeral job on a cluster.
///
/// Per launch: build the spec, submit it, watch its lifecycle, read the result,
/// then delete the job. On close: sweep every job still labelled with this
/// instance's `runnerId`.
pub struct JobRunner<C: ?Sized> {
    name: String,
    cluster: Arc<C>,
    config: RunnerConfig,
    builder: JobSpecBuilder,
    retriever: ResultRetriever,
    cleanup: CleanupManager<C>,
    labels: Labels,
    owns_cluster: bool,
    metrics: MetricsHandle,
    closed: AtomicBool,
}

impl<C> JobRunner<C>
where
    C: ClusterApi + ?Sized,
{
    /// Create a runner over a shared cluster handle.
    ///
    /// Fails with [`ErrorKind::Config`] if the configuration is invalid or the
    /// template lacks the target container.
    pub fn new(
        name: impl Into<String>,
        cluster: Arc<C>,
        config: RunnerConfig,
        template: JobTemplate,
    ) -> Result<Self, RunnerError> {
        let name = name.into();
        let config_error =
            |e: podjob_model::ModelError| RunnerError::new(ErrorKind::Config, &name, e.to_string()).with_cause(e);

        config.validate().map_err(config_error)?;
        let builder = JobSpecBuilder::new(template, config.name_prefix.clone()).map_err(config_error)?;

        let mut labels = Labels::new();
        labels
            .insert(LABEL_OWNER, OWNER_VALUE)
            .insert(LABEL_RUNNER_ID, new_runner_id());

        let metrics = noop_metrics();
        let cleanup = CleanupManager::new(
            Arc::clone(&cluster),
            name.clone(),
            config.grace_period_seconds,
            Arc::clone(&metrics),
        );
        let retriever = ResultRetriever::new(SIDECAR_CONTAINER, config.result_path.clone());

        debug!(runner = %name, labels = %labels.to_selector(), "runner created");
        Ok(Self {
            name,
            cluster,
            config,
            builder,
            retriever,
            cleanup,
            labels,
            owns_cluster: false,
            metrics,
            closed: AtomicBool::new(false),
        })
    }

    /// Close the cluster handle together with the runner.
    pub fn owning_cluster(mut self) -> Self {
        self.owns_cluster = true;
        self
    }

    /// Replace the metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.cleanup = self.cleanup.with_metrics(Arc::clone(&metrics));
        self.metrics = metrics;
        self
    }

    /// Value of the `runnerId` label carried by every job of this runner.
    pub fn runner_id(&self) -> &str {
        self.labels.get(LABEL_RUNNER_ID).unwrap_or_default()
    }

    /// Identity labels attached to every job of this runner.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Build the job spec for one call without submitting it.
    pub fn build_spec(&self, function: &str, payload: &str) -> Result<JobSpec, RunnerError> {
        let config_error = |e: podjob_model::ModelError| {
            RunnerError::new(ErrorKind::Config, &self.name, e.to_string()).with_cause(e)
        };
        let resources = self.config.resources().map_err(config_error)?;
        let args = vec![encode_request(function, payload), self.config.result_path.clone()];

        self.builder
            .build(
                &self.config.image,
                args,
                &resources,
                &self.labels,
                self.config.timeout(),
            )
            .map_err(config_error)
    }

    /// Submit, watch and resolve one job.
    async fn run_job(&self, spec: &JobSpec) -> Outcome {
        let handle = match self.cluster.submit_job(spec).await {
            Ok(handle) => handle,
            Err(e) => {
                return Outcome::Failure(
                    RunnerError::new(
                        ErrorKind::Infra,
                        &self.name,
                        format!("failed to submit job '{}'", spec.name()),
                    )
                    .with_cause(e),
                );
            }
        };
        info!(runner = %self.name, job = %handle, "job submitted");

        let subscription = match self.cluster.subscribe(&handle).await {
            Ok(subscription) => subscription,
            Err(e) => {
                return Outcome::Failure(
                    RunnerError::new(
                        ErrorKind::StreamClosed,
                        &self.name,
                        format!("failed to watch job '{}'", handle.name()),
                    )
                    .with_cause(e),
                );
            }
        };

        let (resolver, resolution) = resolution();
        let cancel = CancellationToken::new();
        let _release_watch = cancel.clone().drop_guard();

        tokio::spawn(watch_job(
            Arc::clone(&self.cluster),
            handle.clone(),
            subscription,
            self.retriever.clone(),
            LifecycleMachine::new(self.name.clone(), handle.name()),
            resolver,
            cancel,
        ));

        await_outcome(&self.name, resolution, self.config.timeout()).await
    }
}

#[async_trait]
impl<C> Runner for JobRunner<C>
where
    C: ClusterApi + ?Sized,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "debug", skip(self, payload), fields(runner = %self.name))]
    async fn launch(&self, function: &str, payload: &str) -> Result<String, RunnerError> {
        let spec = self.build_spec(function, payload)?;

        let _cleanup = self.config.delete_pods_after_completion.then(|| {
            self.cleanup
                .guard(JobHandle::new(spec.name(), self.cluster.namespace()))
        });

        self.metrics.record_launch_started(&self.name);
        let started = Instant::now();
        let outcome = self.run_job(&spec).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match outcome {
            Outcome::Success(bytes) => match std::str::from_utf8(&bytes).map(|_| ()) {
                Ok(()) => Outcome::Success(bytes),
                Err(e) => Outcome::Failure(
                    RunnerError::new(
                        ErrorKind::ResultUnavailable,
                        &self.name,
                        format!("result of job '{}' is not valid UTF-8", spec.name()),
                    )
                    .with_cause(e),
                ),
            },
            failure => failure,
        };

        self.metrics
            .record_launch_completed(&self.name, LaunchOutcome::from(&outcome), elapsed_ms);
        match outcome.into_result() {
            Ok(bytes) => {
                info!(job = %spec.name(), elapsed_ms, "job succeeded");
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Err(err) => {
                warn!(job = %spec.name(), kind = err.kind().as_label(), error = %err, "job failed");
                self.metrics
                    .record_launch_failed(&self.name, err.kind().as_label());
                Err(err)
            }
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cleanup.sweep(&self.labels).await;
        if self.owns_cluster {
            self.cluster.close().await;
        }
        info!(runner = %self.name, "runner closed");
    }
}

impl<C: ?Sized> fmt::Debug for JobRunner<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRunner")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("image", &self.config.image)
            .field("owns_cluster", &self.owns_cluster)
            .finish()
    }
}

/// First job argument: `{"function": ..., "payload": ...}`.
///
/// The payload is embedded as JSON when it parses as JSON, as a string otherwise.
fn encode_request(function: &str, payload: &str) -> String {
    let payload = serde_json::from_str::<Value>(payload)
        .unwrap_or_else(|_| Value::String(payload.to_owned()));
    json!({ "function": function, "payload": payload }).to_string()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use podjob_model::{JobPhase, LifecycleEvent};

    use super::*;
    use crate::testing::{FakeCluster, RecordingMetrics, Scripted, eventually};

    fn template() -> JobTemplate {
        JobTemplate::from_json(
            r#"{
                "metadata": {"labels": {"app": "podjob"}},
                "spec": {
                    "restartPolicy": "Never",
                    "containers": [{"name": "job"}, {"name": "tailer", "image": "busybox"}]
                }
            }"#,
        )
        .unwrap()
    }

    fn config() -> RunnerConfig {
        RunnerConfig::new("registry/podjob:1.0")
    }

    fn runner_with(cluster: &Arc<FakeCluster>, config: RunnerConfig) -> JobRunner<FakeCluster> {
        JobRunner::new("k8s", Arc::clone(cluster), config, template()).unwrap()
    }

    fn finished(exit_code: i32) -> Vec<LifecycleEvent> {
        vec![
            LifecycleEvent::pending(),
            LifecycleEvent::running(),
            LifecycleEvent::terminated(exit_code),
        ]
    }

    #[tokio::test]
    async fn successful_job_returns_result_and_is_deleted() {
        let cluster = Arc::new(
            FakeCluster::new()
                .with_events(finished(0))
                .with_artifact(b"[\"a\",\"b\"]"),
        );
        let runner = runner_with(&cluster, config());

        let out = runner.launch("topics", r#"{"broker":"b1"}"#).await.unwrap();
        assert_eq!(out, r#"["a","b"]"#);

        let submitted = cluster.submitted();
        assert_eq!(submitted.len(), 1);
        let spec = &submitted[0];
        assert_eq!(spec.image(), "registry/podjob:1.0");
        assert_eq!(spec.labels().get(LABEL_OWNER), Some(OWNER_VALUE));
        assert_eq!(spec.labels().get(LABEL_RUNNER_ID), Some(runner.runner_id()));

        let request: Value = serde_json::from_str(&spec.args()[0]).unwrap();
        assert_eq!(request, json!({"function": "topics", "payload": {"broker": "b1"}}));
        assert_eq!(spec.args()[1], "/output/response.txt");

        assert!(eventually(|| cluster.deletes().len() == 1).await);
        assert_eq!(cluster.deletes()[0].name(), spec.name());
        assert!(cluster.jobs().is_empty());
    }

    #[test]
    fn non_json_payload_is_sent_as_string() {
        let request: Value = serde_json::from_str(&encode_request("echo", "plain text")).unwrap();
        assert_eq!(request, json!({"function": "echo", "payload": "plain text"}));
    }

    #[tokio::test]
    async fn duplicate_terminal_events_read_result_once() {
        let mut events = finished(0);
        events.push(LifecycleEvent::terminated(0));
        events.push(LifecycleEvent::terminated(0));
        let cluster = Arc::new(FakeCluster::new().with_events(events).with_artifact(b"ok"));
        let runner = runner_with(&cluster, config());

        assert_eq!(runner.launch("f", "{}").await.unwrap(), "ok");
        assert_eq!(cluster.reads(), 1);
    }

    #[tokio::test]
    async fn image_pull_backoff_fails_fast() {
        let cluster = Arc::new(FakeCluster::new().with_events([
            LifecycleEvent::pending(),
            LifecycleEvent::waiting(JobPhase::Pending, "ImagePullBackOff"),
        ]));
        let mut cfg = config();
        cfg.timeout_ms = Some(60_000);
        let runner = runner_with(&cluster, cfg);

        let started = Instant::now();
        let err = runner.launch("f", "{}").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Infra);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(cluster.reads(), 0);
        assert!(eventually(|| cluster.deletes().len() == 1).await);
    }

    #[tokio::test]
    async fn pending_with_transient_reason_keeps_waiting() {
        let cluster = Arc::new(
            FakeCluster::new()
                .with_events([
                    LifecycleEvent::pending(),
                    LifecycleEvent::waiting(JobPhase::Pending, "ContainerCreating"),
                    LifecycleEvent::running(),
                    LifecycleEvent::terminated(0),
                ])
                .with_artifact(b"done"),
        );
        let runner = runner_with(&cluster, config());

        assert_eq!(runner.launch("f", "{}").await.unwrap(), "done");
    }

    #[tokio::test]
    async fn timeout_releases_watch_and_deletes_once() {
        let cluster = Arc::new(FakeCluster::new().with_events([LifecycleEvent::pending()]));
        let mut cfg = config();
        cfg.timeout_ms = Some(50);
        let runner = runner_with(&cluster, cfg);

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        assert!(eventually(|| cluster.released() == 1).await);
        assert!(eventually(|| cluster.deletes().len() == 1).await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cluster.deletes().len(), 1);
    }

    #[tokio::test]
    async fn exit_zero_with_unreadable_result_is_result_unavailable() {
        let cluster = Arc::new(
            FakeCluster::new()
                .with_events(finished(0))
                .failing_reads("no such file"),
        );
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResultUnavailable);
        assert!(err.cause().is_some());
    }

    #[tokio::test]
    async fn non_utf8_result_is_result_unavailable() {
        let cluster = Arc::new(
            FakeCluster::new()
                .with_events(finished(0))
                .with_artifact([0xff_u8, 0xfe]),
        );
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResultUnavailable);
    }

    #[tokio::test]
    async fn structured_failure_becomes_remote_failure() {
        let cluster = Arc::new(
            FakeCluster::new()
                .with_events(finished(1))
                .with_artifact(br#"{"message":"topic not found","stackTrace":"at x"}"#),
        );
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);
        assert_eq!(err.message(), "topic not found");
        assert_eq!(err.remote_trace(), Some("at x"));
    }

    #[tokio::test]
    async fn unstructured_failure_becomes_non_zero_exit() {
        let cluster = Arc::new(
            FakeCluster::new()
                .with_events(finished(137))
                .with_artifact(b"Killed"),
        );
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonZeroExit);
        assert!(err.message().contains("137"));
    }

    #[tokio::test]
    async fn stream_error_is_stream_closed_with_cause() {
        let cluster = Arc::new(FakeCluster::new().with_script([
            Scripted::Event(LifecycleEvent::pending()),
            Scripted::Fail("connection reset".into()),
        ]));
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamClosed);
        assert!(err.cause().unwrap().to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn stream_end_is_stream_closed_without_cause() {
        let cluster = Arc::new(
            FakeCluster::new()
                .with_events([LifecycleEvent::pending(), LifecycleEvent::running()])
                .closing_stream(),
        );
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamClosed);
        assert!(err.cause().is_none());
    }

    #[tokio::test]
    async fn missing_target_container_is_infra() {
        let cluster = Arc::new(
            FakeCluster::new().with_events([LifecycleEvent::new(Some(JobPhase::Running), None)]),
        );
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infra);
    }

    #[tokio::test]
    async fn job_deleted_before_terminal_state_is_infra() {
        let cluster = Arc::new(FakeCluster::new().with_events([
            LifecycleEvent::pending(),
            LifecycleEvent::running().into_deleted(),
        ]));
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infra);
    }

    #[tokio::test]
    async fn submit_failure_is_infra_and_still_cleans_up() {
        let cluster = Arc::new(FakeCluster::new().failing_submit());
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infra);
        assert!(err.cause().is_some());
        assert!(eventually(|| cluster.deletes().len() == 1).await);
    }

    #[tokio::test]
    async fn subscribe_failure_is_stream_closed() {
        let cluster = Arc::new(FakeCluster::new().failing_subscribe());
        let runner = runner_with(&cluster, config());

        let err = runner.launch("f", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamClosed);
    }

    #[tokio::test]
    async fn delete_disabled_leaves_job_for_close() {
        let cluster = Arc::new(FakeCluster::new().with_events(finished(0)));
        let mut cfg = config();
        cfg.delete_pods_after_completion = false;
        let runner = runner_with(&cluster, cfg);

        runner.launch("f", "{}").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cluster.deletes().is_empty());
        assert_eq!(cluster.jobs().len(), 1);

        runner.close().await;
        assert!(cluster.jobs().is_empty());
    }

    #[tokio::test]
    async fn cancelled_launch_still_deletes_its_job() {
        let cluster = Arc::new(FakeCluster::new().with_events([LifecycleEvent::pending()]));
        let runner = runner_with(&cluster, config());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(30), runner.launch("f", "{}")).await;
        assert!(abandoned.is_err());

        assert!(eventually(|| cluster.deletes().len() == 1).await);
        assert!(eventually(|| cluster.released() == 1).await);
    }

    #[tokio::test]
    async fn close_sweeps_only_own_jobs_and_is_idempotent() {
        let cluster = Arc::new(FakeCluster::new().with_events(finished(0)));
        let mut cfg = config();
        cfg.delete_pods_after_completion = false;
        let first = runner_with(&cluster, cfg.clone());
        let second = runner_with(&cluster, cfg);
        assert_ne!(first.runner_id(), second.runner_id());

        first.launch("f", "{}").await.unwrap();
        second.launch("f", "{}").await.unwrap();
        assert_eq!(cluster.jobs().len(), 2);

        first.close().await;
        first.close().await;

        assert!(first.is_closed());
        assert_eq!(cluster.sweeps(), vec![first.labels().clone()]);
        let left = cluster.jobs();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name(), cluster.submitted()[1].name());
        assert_eq!(cluster.closes(), 0);
    }

    #[tokio::test]
    async fn owning_runner_closes_cluster() {
        let cluster = Arc::new(FakeCluster::new());
        let runner = runner_with(&cluster, config()).owning_cluster();

        runner.close().await;
        runner.close().await;
        assert_eq!(cluster.closes(), 1);
    }

    #[tokio::test]
    async fn metrics_follow_launch_outcomes() {
        let cluster = Arc::new(FakeCluster::new().with_events([LifecycleEvent::pending()]));
        let metrics = Arc::new(RecordingMetrics::default());
        let mut cfg = config();
        cfg.timeout_ms = Some(20);
        let runner = runner_with(&cluster, cfg).with_metrics(metrics.clone());

        runner.launch("f", "{}").await.unwrap_err();

        assert_eq!(
            metrics.calls(),
            ["started k8s", "completed k8s timeout", "failed k8s timeout"]
        );
    }

    #[tokio::test]
    async fn metrics_label_success_and_unreadable_results() {
        let metrics = Arc::new(RecordingMetrics::default());

        let cluster = Arc::new(
            FakeCluster::new()
                .with_events(finished(0))
                .with_artifact(b"ok"),
        );
        let runner = runner_with(&cluster, config()).with_metrics(metrics.clone());
        assert_eq!(runner.launch("f", "{}").await.unwrap(), "ok");

        let cluster = Arc::new(
            FakeCluster::new()
                .with_events(finished(0))
                .with_artifact([0xff_u8, 0xfe]),
        );
        let runner = runner_with(&cluster, config()).with_metrics(metrics.clone());
        runner.launch("f", "{}").await.unwrap_err();

        assert_eq!(
            metrics.calls(),
            [
                "started k8s",
                "completed k8s success",
                "started k8s",
                "completed k8s failure",
                "failed k8s result_unavailable",
            ]
        );
    }

    #[tokio::test]
    async fn failed_cleanup_is_counted_not_raised() {
        let cluster = Arc::new(
            FakeCluster::new()
                .with_events(finished(0))
                .with_artifact(b"ok")
                .failing_deletes(),
        );
        let metrics = Arc::new(RecordingMetrics::default());
        let runner = runner_with(&cluster, config()).with_metrics(metrics.clone());

        assert_eq!(runner.launch("f", "{}").await.unwrap(), "ok");
        assert!(eventually(|| metrics.calls().contains(&"cleanup k8s delete".to_string())).await);

        runner.close().await;
        assert!(metrics.calls().contains(&"cleanup k8s sweep".to_string()));
    }

    #[test]
    fn template_without_target_is_config_error() {
        let cluster = Arc::new(FakeCluster::new());
        let template =
            JobTemplate::from_json(r#"{"spec":{"containers":[{"name":"tailer"}]}}"#).unwrap();

        let err = JobRunner::new("k8s", cluster, config(), template).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn invalid_config_is_config_error() {
        let cluster = Arc::new(FakeCluster::new());
        let mut cfg = config();
        cfg.cpu = "lots".into();

        let err = JobRunner::new("k8s", cluster, cfg, template()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
