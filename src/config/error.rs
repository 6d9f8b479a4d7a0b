//! Configuration error types.

use thiserror::Error;

/// Failure while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}

/// Failure while validating loaded configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required configuration: {0}")]
    MissingRequired(&'static str),

    #[error("invalid configuration for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    /// Creates an invalid-field error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
