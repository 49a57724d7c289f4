use serde::{Deserialize, Serialize};

/// Structured failure written to the result artifact by a job that exited non-zero.
///
/// ```json
/// {"function": "topics", "message": "broker unreachable", "stackTrace": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailurePayload {
    /// Function the job was asked to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub message: String,
    #[serde(default, alias = "remoteTrace", skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl FailurePayload {
    /// Parse an artifact as a failure payload; `None` if it is not one.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}
