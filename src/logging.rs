//! Tracing initialization

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Filter built from the configured default level.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(level.to_lowercase())
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies.
/// Output format follows the configured `LOG_FORMAT`.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(&config.level));

    match config.format {
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .init(),
        LogFormat::Plain => fmt().with_env_filter(filter).init(),
    }
}
