//! Well-known label keys attached to every job a runner creates.
//!
//! The pair `{owner, runnerId}` is what the orphan sweep selects on, so both
//! sides (job creation and sweep) must read the keys from here.

/// Label key naming the kind of runner that created a job.
pub const LABEL_OWNER: &str = "owner";

/// Value stored under [`LABEL_OWNER`] for jobs created by this workspace.
pub const OWNER_VALUE: &str = "podjob";

/// Label key carrying the unique identity of the runner instance.
///
/// Generated once per runner; never shared between two runner instances.
pub const LABEL_RUNNER_ID: &str = "runnerId";
