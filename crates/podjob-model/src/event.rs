use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse lifecycle phase of a job as reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPhase {
    /// Accepted but not all containers are started yet (scheduling, image pull).
    Pending,
    /// At least one container is running.
    Running,
    /// All containers have terminated.
    Terminated,
    /// The orchestrator could not determine the phase.
    Unknown,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Pending => "Pending",
            JobPhase::Running => "Running",
            JobPhase::Terminated => "Terminated",
            JobPhase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the target container within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    Waiting { reason: Option<String> },
    Running,
    Terminated { exit_code: i32 },
}

impl ContainerState {
    /// Waiting reason, if the container is waiting and the orchestrator gave one.
    pub fn waiting_reason(&self) -> Option<&str> {
        match self {
            ContainerState::Waiting { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// Exit code, if the container has terminated.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ContainerState::Terminated { exit_code } => Some(*exit_code),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::Waiting { reason: Some(r) } => write!(f, "waiting({r})"),
            ContainerState::Waiting { reason: None } => f.write_str("waiting"),
            ContainerState::Running => f.write_str("running"),
            ContainerState::Terminated { exit_code } => write!(f, "terminated({exit_code})"),
        }
    }
}

/// One notification about a job's status.
///
/// `target` is `None` when the orchestrator reported a status for the job but
/// nothing for the target container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub phase: Option<JobPhase>,
    pub target: Option<ContainerState>,
    /// The job object itself was removed from the cluster.
    #[serde(default)]
    pub deleted: bool,
}

impl LifecycleEvent {
    pub fn new(phase: Option<JobPhase>, target: Option<ContainerState>) -> Self {
        Self {
            phase,
            target,
            deleted: false,
        }
    }

    pub fn pending() -> Self {
        Self::new(Some(JobPhase::Pending), None)
    }

    pub fn waiting(phase: JobPhase, reason: impl Into<String>) -> Self {
        Self::new(
            Some(phase),
            Some(ContainerState::Waiting {
                reason: Some(reason.into()),
            }),
        )
    }

    pub fn running() -> Self {
        Self::new(Some(JobPhase::Running), Some(ContainerState::Running))
    }

    pub fn terminated(exit_code: i32) -> Self {
        Self::new(
            Some(JobPhase::Terminated),
            Some(ContainerState::Terminated { exit_code }),
        )
    }

    /// Mark the event as a deletion notice.
    pub fn into_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Some(JobPhase::Pending)
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = self.phase.map(|p| p.as_str()).unwrap_or("<none>");
        match &self.target {
            Some(state) => write!(f, "phase={phase} target={state}")?,
            None => write!(f, "phase={phase} target=<missing>")?,
        }
        if self.deleted {
            f.write_str(" deleted")?;
        }
        Ok(())
    }
}
