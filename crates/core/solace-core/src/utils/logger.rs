//! Logging utilities

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{Result, SolaceError};

/// Filter used when neither `RUST_LOG` nor `SOLACE_LOG_LEVEL` is set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Initialize the global logging system.
///
/// `RUST_LOG` wins when set, then `SOLACE_LOG_LEVEL`, then
/// [`DEFAULT_LOG_LEVEL`]. Output goes to stderr so it never mixes with the
/// chat transcript on stdout.
pub fn init_logging() -> Result<()> {
    let level = std::env::var("SOLACE_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    init_logging_with(&level)
}

/// Initialize logging with an explicit fallback filter
pub fn init_logging_with(level: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| SolaceError::config(format!("Invalid log filter '{}': {}", level, e)))?,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| SolaceError::config(format!("Logging already initialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_is_config_error() {
        std::env::remove_var("RUST_LOG");
        let err = init_logging_with("solace=loud").unwrap_err();
        assert!(matches!(err, SolaceError::Config(_)));
    }

    #[test]
    fn test_second_init_fails_cleanly() {
        // the first call may lose to another test; the second always fails
        let _ = init_logging_with("debug");
        assert!(init_logging_with("debug").is_err());
    }
}
