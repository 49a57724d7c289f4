//! Process-wide `tracing` subscriber setup for podjob binaries.
mod config;
mod error;
mod format;
mod install;
mod level;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use format::LoggerFormat;
pub use level::LoggerLevel;

/// Install the global subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] on a second call.
///
/// ```rust,no_run
/// use podjob_observe::{LoggerConfig, init_logger};
///
/// init_logger(&LoggerConfig::default()).expect("logger");
/// tracing::info!("ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => install::text(cfg),
        LoggerFormat::Json => install::json(cfg),
        LoggerFormat::Journald => install::journald(cfg),
    }
}
