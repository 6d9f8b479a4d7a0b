//! In-memory conversation repository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::chat::{Conversation, ConversationId};
use crate::ports::{ConversationRepository, RepositoryError};

/// Conversation store backed by a map behind an async lock.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored conversations.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Returns true when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

/// Persists aggregate state only; the stored copy carries no pending events.
fn snapshot(conversation: &Conversation) -> Conversation {
    Conversation::reconstitute(
        conversation.id().clone(),
        conversation.owner().clone(),
        conversation.created_at(),
        conversation.updated_at(),
        conversation.last_message_id().cloned(),
    )
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        self.conversations
            .write()
            .await
            .insert(conversation.id().clone(), snapshot(conversation));
        Ok(())
    }
}
