use k8s_openapi::api::core::v1::{ContainerState as K8sContainerState, Pod};

use podjob_core::{ClusterError, TARGET_CONTAINER};
use podjob_model::{ContainerState, JobPhase, JobSpec, LifecycleEvent};

/// Convert a rendered job spec into the pod to create in `namespace`.
pub fn pod_from_spec(spec: &JobSpec, namespace: &str) -> Result<Pod, ClusterError> {
    let mut pod: Pod = serde_json::from_value(spec.manifest().clone())
        .map_err(|e| ClusterError::Manifest(format!("job '{}': {e}", spec.name())))?;
    pod.metadata.name = Some(spec.name().to_string());
    pod.metadata.namespace = Some(namespace.to_string());
    Ok(pod)
}

/// Project a pod object onto the lifecycle event the runner consumes.
///
/// A pod without any status has not been picked up by the scheduler yet and is
/// reported as pending.
pub fn pod_event(pod: &Pod) -> LifecycleEvent {
    let Some(status) = pod.status.as_ref() else {
        return LifecycleEvent::pending();
    };
    let phase = match status.phase.as_deref() {
        Some(phase) => phase_of(phase),
        None => JobPhase::Pending,
    };
    let target = status
        .container_statuses
        .iter()
        .flatten()
        .find(|c| c.name == TARGET_CONTAINER)
        .and_then(|c| c.state.as_ref())
        .map(container_state);

    LifecycleEvent::new(Some(phase), target)
}

fn phase_of(phase: &str) -> JobPhase {
    match phase {
        "Pending" => JobPhase::Pending,
        "Running" => JobPhase::Running,
        "Succeeded" | "Failed" => JobPhase::Terminated,
        _ => JobPhase::Unknown,
    }
}

fn container_state(state: &K8sContainerState) -> ContainerState {
    if let Some(t) = &state.terminated {
        return ContainerState::Terminated {
            exit_code: t.exit_code,
        };
    }
    if state.running.is_some() {
        return ContainerState::Running;
    }
    ContainerState::Waiting {
        reason: state.waiting.as_ref().and_then(|w| w.reason.clone()),
    }
}
