//! Value objects for the chat domain.
//!
//! All identifiers are opaque trimmed strings validated at construction;
//! equality and hashing are by value.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::DomainError;

/// Maximum content length in characters, counted after trimming.
pub const MAX_CONTENT_LENGTH: usize = 1000;

fn trimmed_non_empty(value: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid_value(field, "cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Creates a ConversationId, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `InvalidValue` if the input is empty or whitespace-only.
    pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
        Ok(Self(trimmed_non_empty(value.as_ref(), "conversation_id")?))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a MessageId, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `InvalidValue` if the input is empty or whitespace-only.
    pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
        Ok(Self(trimmed_non_empty(value.as_ref(), "message_id")?))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner of a conversation, typically an external user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    /// Creates an Owner, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `InvalidValue` if the input is empty or whitespace-only.
    pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
        Ok(Self(trimmed_non_empty(value.as_ref(), "owner")?))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message content: 1 to 1000 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(String);

impl Content {
    /// Creates Content, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `InvalidValue` if the trimmed input is empty or longer than
    /// [`MAX_CONTENT_LENGTH`] characters.
    pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = trimmed_non_empty(value.as_ref(), "content")?;
        if trimmed.chars().count() > MAX_CONTENT_LENGTH {
            return Err(DomainError::invalid_value(
                "content",
                format!("cannot exceed {} characters", MAX_CONTENT_LENGTH),
            ));
        }
        Ok(Self(trimmed))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn conversation_id_trims_whitespace() {
        let id = ConversationId::new("  c1  ").unwrap();
        assert_eq!(id.as_str(), "c1");
    }

    #[test]
    fn conversation_id_rejects_empty() {
        assert!(ConversationId::new("").is_err());
        assert!(ConversationId::new("   ").is_err());
    }

    #[test]
    fn message_id_equality_is_by_value() {
        let a = MessageId::new("m1").unwrap();
        let b = MessageId::new(" m1 ").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn message_id_rejects_whitespace_only() {
        assert!(MessageId::new("\t\n").is_err());
    }

    #[test]
    fn owner_rejects_empty() {
        assert!(Owner::new("").is_err());
    }

    #[test]
    fn content_accepts_exactly_max_length() {
        let content = Content::new("x".repeat(MAX_CONTENT_LENGTH)).unwrap();
        assert_eq!(content.as_str().chars().count(), MAX_CONTENT_LENGTH);
    }

    #[test]
    fn content_rejects_one_past_max_length() {
        let result = Content::new("x".repeat(MAX_CONTENT_LENGTH + 1));
        assert!(matches!(
            result,
            Err(DomainError::InvalidValue { field: "content", .. })
        ));
    }

    #[test]
    fn content_length_counts_characters_after_trimming() {
        // 1000 chars surrounded by whitespace is still valid
        let padded = format!("  {}  ", "x".repeat(MAX_CONTENT_LENGTH));
        assert!(Content::new(padded).is_ok());
    }

    #[test]
    fn content_rejects_whitespace_only() {
        assert!(Content::new("   ").is_err());
    }

    proptest! {
        #[test]
        fn content_within_bounds_is_accepted(len in 1usize..=MAX_CONTENT_LENGTH) {
            let content = Content::new("a".repeat(len)).unwrap();
            prop_assert_eq!(content.as_str().chars().count(), len);
        }

        #[test]
        fn content_over_bound_is_rejected(extra in 1usize..100) {
            prop_assert!(Content::new("a".repeat(MAX_CONTENT_LENGTH + extra)).is_err());
        }

        #[test]
        fn ids_round_trip_through_display(s in "[a-z0-9-]{1,32}") {
            let id = MessageId::new(&s).unwrap();
            prop_assert_eq!(id.to_string(), s);
        }
    }
}
