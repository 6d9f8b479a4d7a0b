//! Message aggregate.
//!
//! # Invariants
//!
//! - `id` is immutable for the lifetime of the aggregate; the upsert
//!   orchestrator rejects attempts to reuse an id under another conversation
//! - `updated_at >= created_at`

use crate::domain::chat::events::{MessageCreated, MessageUpdated};
use crate::domain::chat::values::{Content, ConversationId, MessageId};
use crate::domain::foundation::{DomainEvent, EventRecorder, Timestamp};

/// Message aggregate root.
#[derive(Debug, Clone)]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    content: Content,
    created_at: Timestamp,
    updated_at: Timestamp,
    is_deleted: bool,
    events: EventRecorder,
}

impl Message {
    /// Creates a new message, recording `message.created`.
    pub fn create(id: MessageId, conversation_id: ConversationId, content: Content) -> Self {
        let now = Timestamp::now();
        let mut message = Self {
            id,
            conversation_id,
            content,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            events: EventRecorder::new(),
        };
        message.events.record(
            MessageCreated {
                message_id: message.id.to_string(),
                conversation_id: message.conversation_id.to_string(),
                content: message.content.to_string(),
            }
            .into_event(),
        );
        message
    }

    /// Reconstitutes a message from persistence (no events recorded).
    pub fn reconstitute(
        id: MessageId,
        conversation_id: ConversationId,
        content: Content,
        created_at: Timestamp,
        updated_at: Timestamp,
        is_deleted: bool,
    ) -> Self {
        Self {
            id,
            conversation_id,
            content,
            created_at,
            updated_at,
            is_deleted,
            events: EventRecorder::new(),
        }
    }

    /// Returns the message id.
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the owning conversation id.
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Returns the content.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Returns when the message was created.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the message was last updated.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the message was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Replaces the content, recording `message.updated`.
    ///
    /// Identical content is a no-op: nothing is recorded and `updated_at`
    /// is left alone, which is what makes repeated upserts idempotent.
    /// Returns true if the content actually changed.
    pub fn update_content(&mut self, new_content: Content) -> bool {
        if new_content == self.content {
            return false;
        }
        self.content = new_content;
        self.updated_at = Timestamp::now();
        self.events.record(
            MessageUpdated {
                message_id: self.id.to_string(),
                conversation_id: self.conversation_id.to_string(),
                new_content: self.content.to_string(),
            }
            .into_event(),
        );
        true
    }

    /// Marks the message as deleted.
    ///
    /// Deletion is silent in the event stream: downstream consumers learn of
    /// removals through `conversation.truncated` on the owning conversation.
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.updated_at = Timestamp::now();
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

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}
