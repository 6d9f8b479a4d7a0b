//! In-memory message repository.
//!
//! The total order over a conversation's messages is `(created_at, id)`;
//! chronology checks and pagination both read through it.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::chat::{ConversationId, Message, MessageId};
use crate::ports::{MessageRepository, RepositoryError};

/// Message store backed by a map behind an async lock.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<HashMap<MessageId, Message>>,
}

impl InMemoryMessageRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored messages, deleted ones included.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Returns true when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

/// Persists aggregate state only; the stored copy carries no pending events.
fn snapshot(message: &Message) -> Message {
    Message::reconstitute(
        message.id().clone(),
        message.conversation_id().clone(),
        message.content().clone(),
        message.created_at(),
        message.updated_at(),
        message.is_deleted(),
    )
}

/// Live messages of a conversation in `(created_at, id)` order.
fn ordered_live(store: &HashMap<MessageId, Message>, conversation_id: &ConversationId) -> Vec<Message> {
    let mut live: Vec<Message> = store
        .values()
        .filter(|m| m.conversation_id() == conversation_id && !m.is_deleted())
        .cloned()
        .collect();
    live.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
    live
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        Ok(self.messages.read().await.get(id).cloned())
    }

    async fn save(&self, message: &Message) -> Result<(), RepositoryError> {
        self.messages
            .write()
            .await
            .insert(message.id().clone(), snapshot(message));
        Ok(())
    }

    async fn find_messages_after(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<Vec<MessageId>, RepositoryError> {
        let store = self.messages.read().await;
        let anchor = match store.get(message_id) {
            Some(anchor) if anchor.conversation_id() == conversation_id => anchor.clone(),
            _ => return Ok(Vec::new()),
        };
        let anchor_key = (anchor.created_at(), anchor.id().clone());

        Ok(ordered_live(&store, conversation_id)
            .into_iter()
            .filter(|m| (m.created_at(), m.id().clone()) > anchor_key)
            .map(|m| m.id().clone())
            .collect())
    }

    async fn soft_delete_messages(&self, ids: &[MessageId]) -> Result<(), RepositoryError> {
        let mut store = self.messages.write().await;
        for id in ids {
            if let Some(message) = store.get_mut(id) {
                message.soft_delete();
            }
        }
        Ok(())
    }

    async fn paginate_messages(
        &self,
        conversation_id: &ConversationId,
        cursor: Option<&MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let store = self.messages.read().await;
        let live = ordered_live(&store, conversation_id);

        let start = match cursor {
            None => 0,
            // Unknown cursor: no match found, the scan falls through the end.
            Some(cursor) => match live.iter().position(|m| m.id() == cursor) {
                Some(index) => index + 1,
                None => live.len(),
            },
        };

        Ok(live.into_iter().skip(start).take(limit).collect())
    }
}
