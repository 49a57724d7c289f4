pub mod cleanup;
pub mod cluster;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod outcome;
pub mod retriever;
pub mod runner;
pub mod template;
pub mod timeout;

#[cfg(test)]
mod testing;

pub use cluster::{ClusterApi, ClusterError, EventSink, Subscription};
pub use error::{ErrorKind, RunnerError};
pub use metrics::{LaunchOutcome, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};
pub use outcome::Outcome;
pub use runner::{JobRunner, Runner};
pub use template::{JobSpecBuilder, JobTemplate, SIDECAR_CONTAINER, TARGET_CONTAINER};

pub mod prelude {
    pub use crate::cluster::{ClusterApi, ClusterError, Subscription};
    pub use crate::error::{ErrorKind, RunnerError};
    pub use crate::runner::{JobRunner, Runner};
    pub use crate::template::JobTemplate;
}
