use serde::{Deserialize, Serialize};

/// Where and how to reach the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Namespace every job is created in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Kubeconfig context. In-cluster or default kubeconfig inference when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            context: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: ClusterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, ClusterConfig::default());
        assert_eq!(cfg.namespace, "default");
    }

    #[test]
    fn context_is_optional() {
        let cfg: ClusterConfig =
            serde_json::from_str(r#"{"namespace":"jobs","context":"staging"}"#).unwrap();
        assert_eq!(cfg.namespace, "jobs");
        assert_eq!(cfg.context.as_deref(), Some("staging"));
    }
}
