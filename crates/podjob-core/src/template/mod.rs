//! Job template loading and job spec construction.
//!
//! The template is a structured document (JSON) giving defaults for every field the
//! runner does not set itself. It must declare the target container; the sidecar is
//! only named here because the result artifact is read through it.
mod builder;
pub use builder::JobSpecBuilder;

use std::path::Path;

use serde_json::Value;

use podjob_model::{ModelError, ModelResult};

/// Name of the container whose exit status decides the launch.
pub const TARGET_CONTAINER: &str = "job";

/// Name of the companion container that outlives the target and serves the result artifact.
pub const SIDECAR_CONTAINER: &str = "tailer";

/// Parsed and structurally checked job template.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTemplate {
    document: Value,
}

impl JobTemplate {
    /// Parse a template from JSON text.
    pub fn from_json(raw: &str) -> ModelResult<Self> {
        let document: Value =
            serde_json::from_str(raw).map_err(|e| ModelError::Template(e.to_string()))?;
        Self::from_value(document)
    }

    /// Load a template from a JSON file.
    pub fn from_path(path: &Path) -> ModelResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ModelError::Template(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Wrap an already parsed document.
    ///
    /// Rules:
    /// - the root is an object;
    /// - `metadata`, if present, is an object;
    /// - `spec.containers` is a non-empty array of objects, each with a string `name`.
    pub fn from_value(document: Value) -> ModelResult<Self> {
        let root = document
            .as_object()
            .ok_or_else(|| ModelError::Template("root must be an object".into()))?;

        if let Some(metadata) = root.get("metadata") {
            if !metadata.is_object() {
                return Err(ModelError::Template("metadata must be an object".into()));
            }
        }

        let containers = root
            .get("spec")
            .and_then(|s| s.get("containers"))
            .and_then(Value::as_array)
            .ok_or_else(|| ModelError::Template("spec.containers must be an array".into()))?;

        if containers.is_empty() {
            return Err(ModelError::Template("spec.containers is empty".into()));
        }
        for (idx, c) in containers.iter().enumerate() {
            if c.get("name").and_then(Value::as_str).is_none() {
                return Err(ModelError::Template(format!(
                    "spec.containers[{idx}] has no name"
                )));
            }
        }
        Ok(Self { document })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns `true` if the template declares a container with this name.
    pub fn has_container(&self, name: &str) -> bool {
        self.container_names().any(|n| n == name)
    }

    /// Names of all declared containers, in template order.
    pub fn container_names(&self) -> impl Iterator<Item = &str> {
        self.document
            .get("spec")
            .and_then(|s| s.get("containers"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|c| c.get("name").and_then(Value::as_str))
    }
}
