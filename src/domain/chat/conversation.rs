//! Conversation aggregate.
//!
//! A conversation owns the ordered set of messages sharing its id (1:N by
//! `conversation_id`); `last_message_id` is a non-owning back-reference used
//! only for quick lookup.
//!
//! # Invariants
//!
//! - `updated_at >= created_at`
//! - `last_message_id` is set only after at least one message was upserted

use crate::domain::chat::events::{ConversationCreated, ConversationTruncated};
use crate::domain::chat::values::{ConversationId, MessageId, Owner};
use crate::domain::foundation::{DomainEvent, EventRecorder, Timestamp};

/// Conversation aggregate root.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: ConversationId,
    owner: Owner,
    created_at: Timestamp,
    updated_at: Timestamp,
    last_message_id: Option<MessageId>,
    events: EventRecorder,
}

impl Conversation {
    /// Creates a new conversation, recording `conversation.created`.
    pub fn create(id: ConversationId, owner: Owner) -> Self {
        let now = Timestamp::now();
        let mut conversation = Self {
            id,
            owner,
            created_at: now,
            updated_at: now,
            last_message_id: None,
            events: EventRecorder::new(),
        };
        conversation.events.record(
            ConversationCreated {
                conversation_id: conversation.id.to_string(),
                owner: conversation.owner.to_string(),
            }
            .into_event(),
        );
        conversation
    }

    /// Reconstitutes a conversation from persistence (no events recorded).
    pub fn reconstitute(
        id: ConversationId,
        owner: Owner,
        created_at: Timestamp,
        updated_at: Timestamp,
        last_message_id: Option<MessageId>,
    ) -> Self {
        Self {
            id,
            owner,
            created_at,
            updated_at,
            last_message_id,
            events: EventRecorder::new(),
        }
    }

    /// Returns the conversation id.
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Returns the owner.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Returns when the conversation was created.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the conversation was last updated.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns the id of the most recently upserted message, if any.
    pub fn last_message_id(&self) -> Option<&MessageId> {
        self.last_message_id.as_ref()
    }

    /// Points the conversation at its most recently upserted message.
    pub fn update_last_message(&mut self, message_id: MessageId) {
        self.last_message_id = Some(message_id);
        self.updated_at = Timestamp::now();
    }

    /// Records that every message after `from` was removed.
    pub fn record_truncated(&mut self, from: &MessageId) {
        self.events.record(
            ConversationTruncated {
                conversation_id: self.id.to_string(),
                from_message_id: from.to_string(),
            }
            .into_event(),
        );
    }

    /// Drains and returns pending domain events, oldest first.
    pub fn pull_events(&mut self) -> Vec<DomainEvent> {
        self.events.pull_events()
    }

    /// Returns true if any events are waiting to be pulled.
    pub fn has_pending_events(&self) -> bool {
        self.events.has_pending()
    }
}

impl PartialEq for Conversation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Conversation {}
