use std::time::Duration;

use serde_json::Value;

use crate::{Labels, job::ResourceRequests};

/// Fully rendered job specification.
///
/// Holds the programmatic inputs (name, labels, image, args, resources, deadline)
/// next to the manifest document they were rendered into. Immutable once built:
/// only the builder in `podjob-core` constructs it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    name: String,
    labels: Labels,
    image: String,
    args: Vec<String>,
    resources: ResourceRequests,
    deadline: Option<Duration>,
    manifest: Value,
}

impl JobSpec {
    /// Assemble a spec from already-rendered parts.
    ///
    /// The caller guarantees that `manifest` reflects every other field.
    pub fn from_parts(
        name: String,
        labels: Labels,
        image: String,
        args: Vec<String>,
        resources: ResourceRequests,
        deadline: Option<Duration>,
        manifest: Value,
    ) -> Self {
        Self {
            name,
            labels,
            image,
            args,
            resources,
            deadline,
            manifest,
        }
    }

    /// Generated unique job name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn resources(&self) -> &ResourceRequests {
        &self.resources
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Rendered manifest handed to the orchestrator on submission.
    pub fn manifest(&self) -> &Value {
        &self.manifest
    }
}
