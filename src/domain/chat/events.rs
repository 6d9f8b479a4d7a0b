//! Typed chat events and their envelope constructors.
//!
//! Each event type knows its kind name, how to build a [`DomainEvent`]
//! envelope, and how to rebuild itself from one received off the wire.
//! [`ChatEvent`] is the tagged variant used for name-based dispatch on the
//! consumption path.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::foundation::DomainEvent;

/// Failure to rebuild a typed event from an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventDecodeError {
    #[error("unknown event kind '{0}'")]
    UnknownKind(String),

    #[error("event '{kind}' is missing payload field '{field}'")]
    MissingField { kind: &'static str, field: &'static str },
}

fn require<'a>(
    event: &'a DomainEvent,
    kind: &'static str,
    field: &'static str,
) -> Result<&'a str, EventDecodeError> {
    event
        .payload_value(field)
        .ok_or(EventDecodeError::MissingField { kind, field })
}

/// A conversation came into existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationCreated {
    pub conversation_id: String,
    pub owner: String,
}

impl ConversationCreated {
    /// Kind name used for routing.
    pub const KIND: &'static str = "conversation.created";

    /// Builds the envelope recorded by the Conversation aggregate.
    pub fn into_event(self) -> DomainEvent {
        let mut payload = BTreeMap::new();
        payload.insert("conversation_id".to_string(), self.conversation_id.clone());
        payload.insert("owner".to_string(), self.owner);
        DomainEvent::new(Self::KIND, Some(self.conversation_id), payload)
    }

    /// Rebuilds the typed event from an envelope.
    pub fn from_event(event: &DomainEvent) -> Result<Self, EventDecodeError> {
        Ok(Self {
            conversation_id: require(event, Self::KIND, "conversation_id")?.to_string(),
            owner: require(event, Self::KIND, "owner")?.to_string(),
        })
    }
}

/// All messages after `from_message_id` were removed from a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTruncated {
    pub conversation_id: String,
    pub from_message_id: String,
}

impl ConversationTruncated {
    /// Kind name used for routing.
    pub const KIND: &'static str = "conversation.truncated";

    /// Builds the envelope recorded by the Conversation aggregate.
    pub fn into_event(self) -> DomainEvent {
        let mut payload = BTreeMap::new();
        payload.insert("conversation_id".to_string(), self.conversation_id.clone());
        payload.insert("from_message_id".to_string(), self.from_message_id);
        DomainEvent::new(Self::KIND, Some(self.conversation_id), payload)
    }

    /// Rebuilds the typed event from an envelope.
    pub fn from_event(event: &DomainEvent) -> Result<Self, EventDecodeError> {
        Ok(Self {
            conversation_id: require(event, Self::KIND, "conversation_id")?.to_string(),
            from_message_id: require(event, Self::KIND, "from_message_id")?.to_string(),
        })
    }
}

/// A message came into existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCreated {
    pub message_id: String,
    pub conversation_id: String,
    pub content: String,
}

impl MessageCreated {
    /// Kind name used for routing.
    pub const KIND: &'static str = "message.created";

    /// Builds the envelope recorded by the Message aggregate.
    pub fn into_event(self) -> DomainEvent {
        let mut payload = BTreeMap::new();
        payload.insert("message_id".to_string(), self.message_id.clone());
        payload.insert("conversation_id".to_string(), self.conversation_id);
        payload.insert("content".to_string(), self.content);
        DomainEvent::new(Self::KIND, Some(self.message_id), payload)
    }

    /// Rebuilds the typed event from an envelope.
    pub fn from_event(event: &DomainEvent) -> Result<Self, EventDecodeError> {
        Ok(Self {
            message_id: require(event, Self::KIND, "message_id")?.to_string(),
            conversation_id: require(event, Self::KIND, "conversation_id")?.to_string(),
            content: require(event, Self::KIND, "content")?.to_string(),
        })
    }
}

/// A message's content changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageUpdated {
    pub message_id: String,
    pub conversation_id: String,
    pub new_content: String,
}

impl MessageUpdated {
    /// Kind name used for routing.
    pub const KIND: &'static str = "message.updated";

    /// Builds the envelope recorded by the Message aggregate.
    pub fn into_event(self) -> DomainEvent {
        let mut payload = BTreeMap::new();
        payload.insert("message_id".to_string(), self.message_id.clone());
        payload.insert("conversation_id".to_string(), self.conversation_id);
        payload.insert("new_content".to_string(), self.new_content);
        DomainEvent::new(Self::KIND, Some(self.message_id), payload)
    }

    /// Rebuilds the typed event from an envelope.
    pub fn from_event(event: &DomainEvent) -> Result<Self, EventDecodeError> {
        Ok(Self {
            message_id: require(event, Self::KIND, "message_id")?.to_string(),
            conversation_id: require(event, Self::KIND, "conversation_id")?.to_string(),
            new_content: require(event, Self::KIND, "new_content")?.to_string(),
        })
    }
}

/// Tagged variant over every chat event kind.
///
/// Consumers that want typed payloads dispatch on the envelope's kind name
/// through here instead of inspecting payload maps by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    ConversationCreated(ConversationCreated),
    ConversationTruncated(ConversationTruncated),
    MessageCreated(MessageCreated),
    MessageUpdated(MessageUpdated),
}

impl ChatEvent {
    /// Dispatches an envelope to the matching typed event.
    ///
    /// # Errors
    ///
    /// `UnknownKind` for kinds outside the chat domain; `MissingField` when
    /// a payload lacks a required field.
    pub fn from_event(event: &DomainEvent) -> Result<Self, EventDecodeError> {
        match event.kind() {
            ConversationCreated::KIND => {
                Ok(Self::ConversationCreated(ConversationCreated::from_event(event)?))
            }
            ConversationTruncated::KIND => Ok(Self::ConversationTruncated(
                ConversationTruncated::from_event(event)?,
            )),
            MessageCreated::KIND => Ok(Self::MessageCreated(MessageCreated::from_event(event)?)),
            MessageUpdated::KIND => Ok(Self::MessageUpdated(MessageUpdated::from_event(event)?)),
            other => Err(EventDecodeError::UnknownKind(other.to_string())),
        }
    }

    /// Returns the kind name of the wrapped event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConversationCreated(_) => ConversationCreated::KIND,
            Self::ConversationTruncated(_) => ConversationTruncated::KIND,
            Self::MessageCreated(_) => MessageCreated::KIND,
            Self::MessageUpdated(_) => MessageUpdated::KIND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_created_round_trips() {
        let event = ConversationCreated {
            conversation_id: "c1".to_string(),
            owner: "u1".to_string(),
        }
        .into_event();

        assert_eq!(event.kind(), "conversation.created");
        assert_eq!(event.aggregate_id(), Some("c1"));

        let typed = ConversationCreated::from_event(&event).unwrap();
        assert_eq!(typed.conversation_id, "c1");
        assert_eq!(typed.owner, "u1");
    }

    #[test]
    fn truncated_event_carries_origin_message() {
        let event = ConversationTruncated {
            conversation_id: "c1".to_string(),
            from_message_id: "m2".to_string(),
        }
        .into_event();

        assert_eq!(event.payload_value("conversation_id"), Some("c1"));
        assert_eq!(event.payload_value("from_message_id"), Some("m2"));
    }

    #[test]
    fn message_events_use_message_id_as_aggregate() {
        let created = MessageCreated {
            message_id: "m1".to_string(),
            conversation_id: "c1".to_string(),
            content: "hi".to_string(),
        }
        .into_event();
        assert_eq!(created.aggregate_id(), Some("m1"));

        let updated = MessageUpdated {
            message_id: "m1".to_string(),
            conversation_id: "c1".to_string(),
            new_content: "hello".to_string(),
        }
        .into_event();
        assert_eq!(updated.aggregate_id(), Some("m1"));
    }

    #[test]
    fn chat_event_dispatches_by_kind() {
        let event = MessageUpdated {
            message_id: "m1".to_string(),
            conversation_id: "c1".to_string(),
            new_content: "hello".to_string(),
        }
        .into_event();

        match ChatEvent::from_event(&event).unwrap() {
            ChatEvent::MessageUpdated(e) => assert_eq!(e.new_content, "hello"),
            other => panic!("expected MessageUpdated, got {:?}", other),
        }
    }

    #[test]
    fn chat_event_rejects_unknown_kind() {
        let event = crate::domain::foundation::DomainEvent::new(
            "billing.invoiced",
            None,
            BTreeMap::new(),
        );
        assert_eq!(
            ChatEvent::from_event(&event),
            Err(EventDecodeError::UnknownKind("billing.invoiced".to_string()))
        );
    }

    #[test]
    fn missing_payload_field_is_reported() {
        let event = crate::domain::foundation::DomainEvent::new(
            MessageCreated::KIND,
            Some("m1".to_string()),
            BTreeMap::new(),
        );
        let err = MessageCreated::from_event(&event).unwrap_err();
        assert!(matches!(err, EventDecodeError::MissingField { field: "message_id", .. }));
    }
}
