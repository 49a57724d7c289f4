use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{ModelError, ModelResult, ResourceRequests, TimeoutMs};

/// Runner configuration.
///
/// Every field except `image` has a default, so a minimal document is just
/// `{"image": "registry/podjob:1.0"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Delete each job right after its launch resolves.
    #[serde(default = "default_delete_after_completion")]
    pub delete_pods_after_completion: bool,
    /// Container image for the target container.
    pub image: String,
    /// CPU request for the target container.
    #[serde(default = "default_cpu")]
    pub cpu: String,
    /// Memory request for the target container.
    #[serde(default = "default_memory")]
    pub memory: String,
    /// Upper bound on how long a launch waits for its job. `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<TimeoutMs>,
    /// Path of the result artifact inside the job's shared volume.
    ///
    /// Passed to the job as its last argument and read back from the sidecar.
    #[serde(default = "default_result_path")]
    pub result_path: String,
    /// Grace period used for every delete.
    #[serde(default)]
    pub grace_period_seconds: u32,
    /// Prefix of generated job names.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    /// Job template file. The bundled template is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

fn default_delete_after_completion() -> bool {
    true
}

fn default_cpu() -> String {
    "500m".to_string()
}

fn default_memory() -> String {
    "512Mi".to_string()
}

fn default_result_path() -> String {
    "/output/response.txt".to_string()
}

fn default_name_prefix() -> String {
    "podjob".to_string()
}

/// Pod names are limited to 63 characters; 37 go to the `-{uuid}` suffix.
const MAX_NAME_PREFIX_LEN: usize = 63 - 37;

fn is_dns_label(value: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    value.starts_with(alnum)
        && value.ends_with(alnum)
        && value.chars().all(|c| alnum(c) || c == '-')
}

impl RunnerConfig {
    /// Configuration with defaults for everything but the image.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            delete_pods_after_completion: default_delete_after_completion(),
            image: image.into(),
            cpu: default_cpu(),
            memory: default_memory(),
            timeout_ms: None,
            result_path: default_result_path(),
            grace_period_seconds: 0,
            name_prefix: default_name_prefix(),
            template: None,
        }
    }

    /// Check the configuration before any job is built from it.
    ///
    /// Rules:
    /// - `image` is not blank;
    /// - `namePrefix` is a lowercase DNS-1123 label short enough for `{prefix}-{uuid}`;
    /// - `cpu` and `memory` are valid quantities;
    /// - `resultPath` is absolute;
    /// - `timeoutMs`, when set, is greater than zero.
    pub fn validate(&self) -> ModelResult<()> {
        if self.image.trim().is_empty() {
            return Err(ModelError::Invalid("image cannot be empty".into()));
        }
        if self.name_prefix.is_empty() {
            return Err(ModelError::Invalid("namePrefix cannot be empty".into()));
        }
        if !is_dns_label(&self.name_prefix) || self.name_prefix.len() > MAX_NAME_PREFIX_LEN {
            return Err(ModelError::Invalid(format!(
                "namePrefix must be a lowercase DNS-1123 label of at most {MAX_NAME_PREFIX_LEN} characters, got '{}'",
                self.name_prefix
            )));
        }
        self.resources()?;
        if !self.result_path.starts_with('/') {
            return Err(ModelError::Invalid(format!(
                "resultPath must be absolute, got '{}'",
                self.result_path
            )));
        }
        if self.timeout_ms == Some(0) {
            return Err(ModelError::Invalid("timeoutMs cannot be zero".into()));
        }
        Ok(())
    }

    /// Resource requests built from `cpu` and `memory`.
    pub fn resources(&self) -> ModelResult<ResourceRequests> {
        ResourceRequests::new(self.cpu.clone(), self.memory.clone())
    }

    /// Launch timeout as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
