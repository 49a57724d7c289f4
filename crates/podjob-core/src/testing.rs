//! In-memory cluster used by unit tests.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use podjob_model::{JobHandle, JobSpec, Labels, LifecycleEvent};

use crate::{
    cluster::{ClusterApi, ClusterError, Subscription},
    metrics::{LaunchOutcome, MetricsBackend},
};

/// One scripted item of a fake event stream.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Event(LifecycleEvent),
    /// Close the stream with a watch error.
    Fail(String),
}

#[derive(Default)]
struct State {
    submitted: Vec<JobSpec>,
    jobs: Vec<(JobHandle, Labels)>,
    deletes: Vec<JobHandle>,
    sweeps: Vec<Labels>,
    reads: usize,
    released: usize,
    closes: usize,
}

/// Scripted [`ClusterApi`]: every subscription replays the same events.
pub(crate) struct FakeCluster {
    namespace: String,
    script: Vec<Scripted>,
    hold_open: bool,
    artifact: Result<Vec<u8>, String>,
    fail_submit: bool,
    fail_subscribe: bool,
    fail_deletes: bool,
    state: Arc<Mutex<State>>,
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self {
            namespace: "default".to_string(),
            script: Vec::new(),
            hold_open: true,
            artifact: Ok(Vec::new()),
            fail_submit: false,
            fail_subscribe: false,
            fail_deletes: false,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub(crate) fn with_events(mut self, events: impl IntoIterator<Item = LifecycleEvent>) -> Self {
        self.script.extend(events.into_iter().map(Scripted::Event));
        self
    }

    pub(crate) fn with_script(mut self, script: impl IntoIterator<Item = Scripted>) -> Self {
        self.script.extend(script);
        self
    }

    /// End the stream once the script is exhausted instead of keeping it open.
    pub(crate) fn closing_stream(mut self) -> Self {
        self.hold_open = false;
        self
    }

    pub(crate) fn with_artifact(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.artifact = Ok(bytes.as_ref().to_vec());
        self
    }

    pub(crate) fn failing_reads(mut self, reason: &str) -> Self {
        self.artifact = Err(reason.to_string());
        self
    }

    pub(crate) fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    pub(crate) fn failing_subscribe(mut self) -> Self {
        self.fail_subscribe = true;
        self
    }

    pub(crate) fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake cluster state poisoned")
    }

    pub(crate) fn submitted(&self) -> Vec<JobSpec> {
        self.state().submitted.clone()
    }

    pub(crate) fn jobs(&self) -> Vec<JobHandle> {
        self.state().jobs.iter().map(|(h, _)| h.clone()).collect()
    }

    pub(crate) fn deletes(&self) -> Vec<JobHandle> {
        self.state().deletes.clone()
    }

    pub(crate) fn sweeps(&self) -> Vec<Labels> {
        self.state().sweeps.clone()
    }

    pub(crate) fn reads(&self) -> usize {
        self.state().reads
    }

    /// Subscriptions released by their consumer while the stream was still open.
    pub(crate) fn released(&self) -> usize {
        self.state().released
    }

    pub(crate) fn closes(&self) -> usize {
        self.state().closes
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn submit_job(&self, spec: &JobSpec) -> Result<JobHandle, ClusterError> {
        if self.fail_submit {
            return Err(ClusterError::Api("admission denied".into()));
        }
        let handle = JobHandle::new(spec.name(), &self.namespace);
        let mut state = self.state();
        state.submitted.push(spec.clone());
        state.jobs.push((handle.clone(), spec.labels().clone()));
        Ok(handle)
    }

    async fn delete_job(&self, handle: &JobHandle, _grace_seconds: u32) -> Result<(), ClusterError> {
        let mut state = self.state();
        state.deletes.push(handle.clone());
        if self.fail_deletes {
            return Err(ClusterError::Api("delete refused".into()));
        }
        state.jobs.retain(|(h, _)| h != handle);
        Ok(())
    }

    async fn delete_jobs_by_label(
        &self,
        labels: &Labels,
        _grace_seconds: u32,
    ) -> Result<(), ClusterError> {
        let mut state = self.state();
        state.sweeps.push(labels.clone());
        if self.fail_deletes {
            return Err(ClusterError::Api("delete collection refused".into()));
        }
        state.jobs.retain(|(_, l)| !l.matches(labels));
        Ok(())
    }

    async fn subscribe(&self, _handle: &JobHandle) -> Result<Subscription, ClusterError> {
        if self.fail_subscribe {
            return Err(ClusterError::Watch("watch forbidden".into()));
        }
        let (sink, subscription) = Subscription::channel(16);
        let script = self.script.clone();
        let hold_open = self.hold_open;
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            for item in script {
                let item = match item {
                    Scripted::Event(event) => Ok(event),
                    Scripted::Fail(reason) => Err(ClusterError::Watch(reason)),
                };
                if !sink.send(item).await {
                    return;
                }
            }
            if hold_open {
                sink.released().await;
                state.lock().expect("fake cluster state poisoned").released += 1;
            }
        });
        Ok(subscription)
    }

    async fn read_file(
        &self,
        _handle: &JobHandle,
        _container: &str,
        _path: &str,
    ) -> Result<Vec<u8>, ClusterError> {
        self.state().reads += 1;
        self.artifact.clone().map_err(ClusterError::ReadRefused)
    }

    async fn close(&self) {
        self.state().closes += 1;
    }
}

/// Metrics backend that keeps every call as a line of text.
#[derive(Default)]
pub(crate) struct RecordingMetrics {
    calls: Mutex<Vec<String>>,
}

impl RecordingMetrics {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("metrics poisoned").clone()
    }

    fn push(&self, call: String) {
        self.calls.lock().expect("metrics poisoned").push(call);
    }
}

impl MetricsBackend for RecordingMetrics {
    fn record_launch_started(&self, runner: &str) {
        self.push(format!("started {runner}"));
    }

    fn record_launch_completed(&self, runner: &str, outcome: LaunchOutcome, _duration_ms: u64) {
        self.push(format!("completed {runner} {}", outcome.as_label()));
    }

    fn record_launch_failed(&self, runner: &str, error_kind: &str) {
        self.push(format!("failed {runner} {error_kind}"));
    }

    fn record_cleanup_error(&self, runner: &str, operation: &str) {
        self.push(format!("cleanup {runner} {operation}"));
    }
}

/// Poll `check` for up to one second.
pub(crate) async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
