use crate::config::LoggerConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct LoggerInitError(String);

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.log_level`. A second call returns an error
/// instead of panicking, so test binaries can call it freely.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| LoggerInitError(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(fmt::layer().with_target(false).with_ansi(false).json())
            .try_init()
            .map_err(|e| LoggerInitError(e.to_string()))
    } else {
        registry
            .with(fmt::layer().with_target(true).compact())
            .try_init()
            .map_err(|e| LoggerInitError(e.to_string()))
    }
}
