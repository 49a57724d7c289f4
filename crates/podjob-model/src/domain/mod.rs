mod labels;
pub use labels::Labels;

mod constants;
pub use constants::{LABEL_OWNER, LABEL_RUNNER_ID, OWNER_VALUE};

mod quantity;
pub use quantity::is_valid_quantity;

/// Timeout value in milliseconds.
///
/// Used by the runner configuration to bound how long a launch waits for its job.
pub type TimeoutMs = u64;
