use uuid::Uuid;

/// Identity of one runner instance, stored in the `runnerId` label of its jobs.
pub fn new_runner_id() -> String {
    Uuid::new_v4().to_string()
}

/// Unique job name.
///
/// Format: `{prefix}-{uuid}`; the random part keeps collisions negligible for
/// the lifetime of a namespace.
pub fn make_job_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}
