use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::LoggerError;

/// A validated `EnvFilter` directive string, e.g. `info` or `podjob_core=debug,warn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoggerLevel(String);

impl LoggerLevel {
    pub fn new(directives: impl Into<String>) -> Result<Self, LoggerError> {
        let directives = directives.into();
        EnvFilter::try_new(&directives)
            .map_err(|e| LoggerError::InvalidLevel(format!("{directives}: {e}")))?;
        Ok(Self(directives))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the filter. Construction already validated the directives.
    pub fn to_env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.0).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LoggerLevel {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LoggerLevel> for String {
    fn from(level: LoggerLevel) -> Self {
        level.0
    }
}

impl fmt::Display for LoggerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_targeted_directives() {
        for ok in ["info", "trace", "podjob_core=debug,warn", "podjob_kube=trace"] {
            assert!(ok.parse::<LoggerLevel>().is_ok(), "{ok} should parse");
        }
    }

    #[test]
    fn rejects_unknown_level_names() {
        for bad in ["podjob_core=loud", "a=trace,b=wat"] {
            assert!(matches!(
                bad.parse::<LoggerLevel>(),
                Err(LoggerError::InvalidLevel(_))
            ));
        }
    }

    #[test]
    fn deserialization_validates() {
        let lvl: LoggerLevel = serde_json::from_str(r#""debug""#).unwrap();
        assert_eq!(lvl.as_str(), "debug");
        assert!(serde_json::from_str::<LoggerLevel>(r#""x=nope""#).is_err());
    }

    #[test]
    fn default_is_info() {
        assert_eq!(LoggerLevel::default().as_str(), "info");
        let _ = LoggerLevel::default().to_env_filter();
    }
}
