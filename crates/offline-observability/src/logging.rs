//! Structured logging setup.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as fmt_layer, EnvFilter, Layer};

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Human => write!(f, "human"),
        }
    }
}

/// Error type for logging setup.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Parse a filter directive such as `"info,offline_gatekeeper=debug"`.
///
/// The directive is always explicit; the environment is not consulted.
pub fn build_filter(directive: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directive).map_err(|e| LoggingError::Filter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global `tracing` subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_tracing(format: LogFormat, directive: &str) -> Result<(), LoggingError> {
    let filter = build_filter(directive)?;

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt_layer::layer().json().with_filter(filter))
            .try_init(),
        LogFormat::Human => tracing_subscriber::registry()
            .with(fmt_layer::layer().with_target(true).with_filter(filter))
            .try_init(),
    };

    result.map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_directives() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("warn,offline_gatekeeper=debug").is_ok());
    }

    #[test]
    fn test_build_filter_rejects_garbage() {
        let err = build_filter("offline_gatekeeper=loud").unwrap_err();
        assert!(matches!(err, LoggingError::Filter { .. }));
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str(r#""human""#).unwrap();
        assert_eq!(format, LogFormat::Human);
        assert_eq!(LogFormat::default().to_string(), "json");
    }

    #[test]
    fn test_init_tracing_twice_fails() {
        let _ = init_tracing(LogFormat::Human, "debug");
        assert!(matches!(
            init_tracing(LogFormat::Json, "info"),
            Err(LoggingError::Init(_))
        ));
    }
}
