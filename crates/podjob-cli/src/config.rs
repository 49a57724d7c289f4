use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use podjob_kube::ClusterConfig;
use podjob_model::RunnerConfig;
use podjob_observe::{LoggerConfig, LoggerLevel};

/// Contents of the `--config` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    pub runner: RunnerConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub namespace: Option<String>,
    pub context: Option<String>,
    pub log_level: Option<LoggerLevel>,
    pub timeout_ms: Option<u64>,
    pub image: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(namespace) = overrides.namespace {
            self.cluster.namespace = namespace;
        }
        if overrides.context.is_some() {
            self.cluster.context = overrides.context;
        }
        if let Some(level) = overrides.log_level {
            self.logger = self.logger.with_level(level);
        }
        if overrides.timeout_ms.is_some() {
            self.runner.timeout_ms = overrides.timeout_ms;
        }
        if let Some(image) = overrides.image {
            self.runner.image = image;
        }
        self
    }
}
