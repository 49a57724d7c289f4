use crate::error::{ErrorKind, RunnerError};

/// Terminal value of one launch. Exactly one is produced per job.
#[derive(Debug)]
pub enum Outcome {
    /// Raw bytes of the result artifact.
    Success(Vec<u8>),
    Failure(RunnerError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Kind of the failure, `None` on success.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err.kind()),
        }
    }

    pub fn into_result(self) -> Result<Vec<u8>, RunnerError> {
        match self {
            Outcome::Success(bytes) => Ok(bytes),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl From<RunnerError> for Outcome {
    fn from(err: RunnerError) -> Self {
        Outcome::Failure(err)
    }
}
