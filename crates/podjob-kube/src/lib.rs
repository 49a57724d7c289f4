//! Kubernetes backend for the pod-per-call runner.
//!
//! [`KubeCluster`] implements [`podjob_core::ClusterApi`] on top of the `kube`
//! client: one pod per job, watched by name, cleaned up by label.
mod cluster;
mod config;
mod convert;
mod exec;
mod runner;
mod watch;

pub use cluster::KubeCluster;
pub use config::ClusterConfig;
pub use convert::{pod_event, pod_from_spec};
pub use runner::{DEFAULT_POD_TEMPLATE, default_template, kube_runner, load_template};
