use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter` when set.
/// Calling it twice returns an error instead of panicking.
pub fn init_logging(default_filter: &str) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|err| TelemetryError::InvalidFilter {
            filter: default_filter.to_string(),
            reason: err.to_string(),
        })?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))?;

    tracing::debug!(filter = default_filter, "logging initialized");
    Ok(())
}
