//! Error types for the domain layer.

use thiserror::Error;

/// Errors raised by value-object construction and aggregate invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A value failed validation. No mutation has occurred when this is
    /// returned; the caller can resubmit corrected input.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// An upsert attempted to move a message to a different conversation.
    /// A message id refers to one logical message forever.
    #[error(
        "message '{message_id}' belongs to conversation '{actual}', \
         refusing to move it to '{requested}'"
    )]
    IdentityConflict {
        message_id: String,
        actual: String,
        requested: String,
    },
}

impl DomainError {
    /// Creates an invalid-value error.
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an identity-conflict error.
    pub fn identity_conflict(
        message_id: impl Into<String>,
        actual: impl Into<String>,
        requested: impl Into<String>,
    ) -> Self {
        DomainError::IdentityConflict {
            message_id: message_id.into(),
            actual: actual.into(),
            requested: requested.into(),
        }
    }
}
