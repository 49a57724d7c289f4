use std::fmt;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{LoggerConfig, LoggerError, LoggerResult};

/// RFC3339 timestamps in UTC.
#[derive(Debug, Clone, Copy)]
struct UtcRfc3339;

impl FormatTime for UtcRfc3339 {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        match OffsetDateTime::now_utc().format(&Rfc3339) {
            Ok(ts) => write!(w, "{ts}"),
            Err(_) => write!(w, "<invalid-time>"),
        }
    }
}

pub(crate) fn text(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(cfg.ansi())
        .with_target(cfg.with_targets)
        .with_timer(UtcRfc3339);
    install(
        tracing_subscriber::registry()
            .with(cfg.level.to_env_filter())
            .with(layer),
    )
}

pub(crate) fn json(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(UtcRfc3339);
    install(
        tracing_subscriber::registry()
            .with(cfg.level.to_env_filter())
            .with(layer),
    )
}

#[cfg(target_os = "linux")]
pub(crate) fn journald(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = tracing_journald::layer().map_err(|e| LoggerError::Journald(e.to_string()))?;
    install(
        tracing_subscriber::registry()
            .with(cfg.level.to_env_filter())
            .with(layer),
    )
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn journald(_cfg: &LoggerConfig) -> LoggerResult<()> {
    Err(LoggerError::JournaldNotSupported)
}

fn install<S>(subscriber: S) -> LoggerResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}
