use std::time::Duration;

use serde_json::{Map, Value, json};

use podjob_model::{JobSpec, Labels, ModelError, ModelResult, ResourceRequests};

use crate::{
    runner::make_job_name,
    template::{JobTemplate, TARGET_CONTAINER},
};

/// Renders [`JobSpec`]s from a [`JobTemplate`].
///
/// Pure apart from the generated job name: the same inputs always yield the same
/// manifest modulo `metadata.name`.
#[derive(Debug, Clone)]
pub struct JobSpecBuilder {
    template: JobTemplate,
    target: String,
    name_prefix: String,
}

impl JobSpecBuilder {
    /// Create a builder, failing if the template has no target container.
    pub fn new(template: JobTemplate, name_prefix: impl Into<String>) -> ModelResult<Self> {
        if !template.has_container(TARGET_CONTAINER) {
            return Err(ModelError::MissingContainer(TARGET_CONTAINER.into()));
        }
        Ok(Self {
            template,
            target: TARGET_CONTAINER.to_string(),
            name_prefix: name_prefix.into(),
        })
    }

    pub fn template(&self) -> &JobTemplate {
        &self.template
    }

    /// Render a new job spec.
    ///
    /// Sets on top of the template:
    /// - `metadata.name` to a freshly generated unique name;
    /// - `metadata.labels` to the template labels merged with `labels` (`labels` win);
    /// - `spec.activeDeadlineSeconds` to `deadline` rounded up to whole seconds;
    /// - the target container's `image`, `args` and `resources.requests`.
    pub fn build(
        &self,
        image: &str,
        args: Vec<String>,
        resources: &ResourceRequests,
        labels: &Labels,
        deadline: Option<Duration>,
    ) -> ModelResult<JobSpec> {
        let name = make_job_name(&self.name_prefix);
        let mut manifest = self.template.document().clone();
        let root = manifest
            .as_object_mut()
            .ok_or_else(|| ModelError::Template("root must be an object".into()))?;

        let metadata = root
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| ModelError::Template("metadata must be an object".into()))?;

        let mut merged: Labels = metadata
            .get("labels")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        for (k, v) in labels.iter() {
            merged.insert(k, v);
        }
        metadata.insert("name".into(), Value::String(name.clone()));
        metadata.insert("labels".into(), labels_to_value(&merged));

        let spec = root
            .get_mut("spec")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ModelError::Template("spec must be an object".into()))?;

        if let Some(deadline) = deadline {
            spec.insert(
                "activeDeadlineSeconds".into(),
                json!(deadline_seconds(deadline)),
            );
        }

        let container = spec
            .get_mut("containers")
            .and_then(Value::as_array_mut)
            .and_then(|cs| {
                cs.iter_mut()
                    .find(|c| c.get("name").and_then(Value::as_str) == Some(self.target.as_str()))
            })
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ModelError::MissingContainer(self.target.clone()))?;

        container.insert("image".into(), json!(image));
        container.insert("args".into(), json!(args));
        container
            .entry("resources")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| ModelError::Template("container resources must be an object".into()))?
            .insert(
                "requests".into(),
                json!({ "cpu": resources.cpu(), "memory": resources.memory() }),
            );

        Ok(JobSpec::from_parts(
            name,
            merged,
            image.to_string(),
            args,
            resources.clone(),
            deadline,
            manifest,
        ))
    }
}

fn labels_to_value(labels: &Labels) -> Value {
    Value::Object(
        labels
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
    )
}

/// Whole seconds, rounded up, never zero.
fn deadline_seconds(deadline: Duration) -> u64 {
    let secs = deadline.as_millis().div_ceil(1000).max(1);
    u64::try_from(secs).unwrap_or(u64::MAX)
}
