//! Chronology service over a conversation's messages.
//!
//! "After" is the repository's total order over live messages in a
//! conversation - `(created_at, id)` here - and the same order drives
//! pagination. Pure read, no side effects.

use std::sync::Arc;

use crate::domain::chat::values::{ConversationId, MessageId};
use crate::ports::{MessageRepository, RepositoryError};

/// Determines which messages sit chronologically after a given one.
pub struct MessageChronology {
    messages: Arc<dyn MessageRepository>,
}

impl MessageChronology {
    /// Creates the service over a message repository.
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Returns the ids of live messages strictly after `message_id`, in order.
    pub async fn messages_after(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<Vec<MessageId>, RepositoryError> {
        self.messages
            .find_messages_after(conversation_id, message_id)
            .await
    }

    /// Returns true iff no live message follows `message_id`.
    pub async fn can_insert(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<bool, RepositoryError> {
        let trailing = self.messages_after(conversation_id, message_id).await?;
        Ok(trailing.is_empty())
    }
}
