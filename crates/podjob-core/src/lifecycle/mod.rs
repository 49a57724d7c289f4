//! Lifecycle state machine for one job.
//!
//! [`LifecycleMachine`] turns an ordered stream of [`LifecycleEvent`]s into exactly
//! one [`Outcome`]. It is pure: reading the result artifact is requested from the
//! caller through [`Step::Collect`] and fed back through [`LifecycleMachine::collect`].
//! [`watch_job`] drives it against a live [`Subscription`](crate::Subscription).
mod resolution;
pub use resolution::{Resolution, Resolver, resolution};

mod watch;
pub use watch::watch_job;

use tracing::{debug, trace};

use podjob_model::LifecycleEvent;

use crate::{
    cluster::ClusterError,
    error::{ErrorKind, RunnerError},
    outcome::Outcome,
    retriever::classify_artifact,
};

/// Waiting reasons after which the target container can never start.
pub const FAST_FAIL_REASONS: &[&str] = &["ImagePullBackOff", "InvalidImageName", "ErrImageNeverPull"];

/// Position of the machine in the job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Init,
    WaitingToStart,
    Running,
    /// Target terminated; waiting for the artifact read.
    Collecting,
    Resolved,
}

/// What the driver has to do after feeding one event.
#[derive(Debug)]
pub enum Step {
    /// Keep listening.
    Wait,
    /// The machine already left the listening states; the event was dropped.
    Ignore,
    /// Read the result artifact, then call [`LifecycleMachine::collect`].
    Collect { exit_code: i32 },
    /// Terminal outcome reached.
    Resolve(Outcome),
}

#[derive(Debug)]
pub struct LifecycleMachine {
    runner: String,
    job: String,
    state: MachineState,
}

impl LifecycleMachine {
    pub fn new(runner: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            runner: runner.into(),
            job: job.into(),
            state: MachineState::Init,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// `true` once no further event can change the outcome.
    pub fn is_done(&self) -> bool {
        matches!(self.state, MachineState::Collecting | MachineState::Resolved)
    }

    /// Feed one event.
    ///
    /// Checks run in a fixed order: fast-fail waiting reason, deletion, pending,
    /// missing target state, terminated target. A pending job therefore never
    /// shadows a fast-fail reason, and a job still spinning up is never reported
    /// as missing its target state.
    pub fn observe(&mut self, event: &LifecycleEvent) -> Step {
        if self.is_done() {
            trace!(job = %self.job, %event, "ignoring event after resolution");
            return Step::Ignore;
        }
        let target = event.target.as_ref();

        if let Some(reason) = target
            .and_then(|s| s.waiting_reason())
            .filter(|r| FAST_FAIL_REASONS.contains(r))
        {
            return self.resolve(ErrorKind::Infra, format!(
                "target container of job '{}' cannot start ({reason}): {event}",
                self.job
            ));
        }

        if event.deleted && target.and_then(|s| s.exit_code()).is_none() {
            return self.resolve(ErrorKind::Infra, format!(
                "job '{}' was deleted before completion: {event}",
                self.job
            ));
        }

        if event.is_pending() {
            if self.state == MachineState::Init {
                self.state = MachineState::WaitingToStart;
            }
            debug!(job = %self.job, "job is spinning up");
            return Step::Wait;
        }

        let Some(state) = target else {
            return self.resolve(ErrorKind::Infra, format!(
                "state for target container of job '{}' not found: {event}",
                self.job
            ));
        };

        if let Some(exit_code) = state.exit_code() {
            debug!(job = %self.job, exit_code, "target container terminated");
            self.state = MachineState::Collecting;
            return Step::Collect { exit_code };
        }

        if matches!(state, podjob_model::ContainerState::Running)
            && self.state != MachineState::Running
        {
            debug!(job = %self.job, "target container is running");
            self.state = MachineState::Running;
        } else {
            trace!(job = %self.job, %state, "target container not terminated yet");
        }
        Step::Wait
    }

    /// Turn the exit code and the artifact read into the outcome.
    pub fn collect(&mut self, exit_code: i32, artifact: Result<Vec<u8>, ClusterError>) -> Outcome {
        self.state = MachineState::Resolved;
        classify_artifact(&self.runner, &self.job, exit_code, artifact)
    }

    /// The event stream ended; resolves `StreamClosed` unless already done.
    pub fn close(&mut self, cause: Option<ClusterError>) -> Option<Outcome> {
        if self.is_done() {
            return None;
        }
        self.state = MachineState::Resolved;

        let err = RunnerError::new(
            ErrorKind::StreamClosed,
            &self.runner,
            format!("event stream of job '{}' closed unexpectedly", self.job),
        );
        Some(Outcome::Failure(match cause {
            Some(cause) => err.with_cause(cause),
            None => err,
        }))
    }

    fn resolve(&mut self, kind: ErrorKind, message: String) -> Step {
        self.state = MachineState::Resolved;
        Step::Resolve(Outcome::Failure(RunnerError::new(kind, &self.runner, message)))
    }
}
