// Tracing log adapter - Subscriber setup for structured logging

use tracing_subscriber::EnvFilter;

use crate::adapters::toml_config::LoggingConfig;
use crate::domain::errors::*;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
pub fn env_filter(level: &str) -> Result<EnvFilter, DomainError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| DomainError::Config(format!("Invalid log level {}: {}", level, e))),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// command output. Calling this twice keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), DomainError> {
    let filter = env_filter(&config.level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!("Logging already initialized");
    }
    Ok(())
}
