//! Tracing subscriber set-up.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Installs a compact fmt subscriber as the global default.
///
/// `RUST_LOG` takes precedence; `default_filter` (for example `info` or
/// `fieldops=debug`) applies when it is unset or invalid. Calling this
/// twice returns [`TelemetryError::Install`] instead of panicking.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a malformed
/// `default_filter`, or [`TelemetryError::Install`] when a global
/// subscriber already exists.
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(TelemetryError::Install)
}
