//! Structured logging initialization.
//!
//! The RUST_LOG environment variable takes precedence over configuration file settings.

use crate::config::{LogFormat, LoggingConfig};
use tracing::Subscriber;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initialize the logging subsystem.
///
/// Fails if a global subscriber is already installed.
///
/// ```ignore
/// let config = mint::config::LoggingConfig::default();
/// mint::logging::init(&config)?;
///
/// tracing::info!(pool_size = 5000, batch_size = 4, "opening packs");
/// ```
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.level.as_str())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(config))
        .try_init()
}

/// Build the formatting layer selected by `config`.
fn fmt_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_target(config.target)
        .with_thread_names(config.thread_names);

    match (config.format, config.timestamps) {
        (LogFormat::Pretty, true) => layer.with_ansi(true).boxed(),
        (LogFormat::Pretty, false) => layer.with_ansi(true).without_time().boxed(),
        (LogFormat::Json, true) => layer.json().boxed(),
        (LogFormat::Json, false) => layer.json().without_time().boxed(),
        (LogFormat::Compact, true) => layer.compact().with_ansi(true).boxed(),
        (LogFormat::Compact, false) => layer.compact().with_ansi(true).without_time().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;

    #[test]
    fn test_every_format_builds() {
        for format in [LogFormat::Pretty, LogFormat::Json, LogFormat::Compact] {
            for timestamps in [true, false] {
                let config = LoggingConfig {
                    format,
                    timestamps,
                    ..LoggingConfig::default()
                };
                let _layer = fmt_layer::<Registry>(&config);
            }
        }
    }

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig::default();
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}
