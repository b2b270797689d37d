//! Error types for the Solace core

use thiserror::Error;

/// Main error type for Solace operations
#[derive(Debug, Error)]
pub enum SolaceError {
    /// Configuration error (invalid settings, missing crisis content)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model/collaborator error (classifier or generator)
    #[error("Model error: {0}")]
    Model(String),

    /// Timeout waiting on a collaborator
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Prompt template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Not found error (generic)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using SolaceError
pub type Result<T> = std::result::Result<T, SolaceError>;

impl SolaceError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        SolaceError::Config(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        SolaceError::Model(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        SolaceError::Timeout(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        SolaceError::Template(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        SolaceError::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        SolaceError::NotFound(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        SolaceError::Other(msg.into())
    }

    /// Create a config error naming a response pool that cannot serve its path
    pub fn invalid_pool(pool: &str, reason: impl std::fmt::Display) -> Self {
        SolaceError::Config(format!("Response pool '{}' is invalid: {}", pool, reason))
    }
}
