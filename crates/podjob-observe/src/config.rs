use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{LoggerFormat, LoggerLevel};

/// Logger settings, usually read from the `logger` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: LoggerLevel,
    /// Print the event target (module path) next to each line.
    pub with_targets: bool,
    /// ANSI colors for the text format. Ignored when stdout is not a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    pub fn with_level(mut self, level: LoggerLevel) -> Self {
        self.level = level;
        self
    }

    pub(crate) fn ansi(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"format":"json"}"#).unwrap();
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.level.as_str(), "info");
        assert!(cfg.with_targets);
        assert!(cfg.use_color);
    }

    #[test]
    fn camel_case_keys() {
        let cfg: LoggerConfig =
            serde_json::from_str(r#"{"level":"debug","withTargets":false,"useColor":false}"#)
                .unwrap();
        assert_eq!(cfg.level.as_str(), "debug");
        assert!(!cfg.with_targets);
        assert!(!cfg.ansi());
    }

    #[test]
    fn level_override() {
        let cfg = LoggerConfig::default().with_level("warn".parse().unwrap());
        assert_eq!(cfg.level.as_str(), "warn");
    }
}
