mod domain;
pub use domain::{LABEL_OWNER, LABEL_RUNNER_ID, OWNER_VALUE};
pub use domain::{Labels, TimeoutMs, is_valid_quantity};

mod error;
pub use error::{ModelError, ModelResult};

mod job;
pub use job::{JobHandle, JobSpec, ResourceRequests};

mod event;
pub use event::{ContainerState, JobPhase, LifecycleEvent};

mod failure;
pub use failure::FailurePayload;

mod config;
pub use config::RunnerConfig;
