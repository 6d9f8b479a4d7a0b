//! GetConversation - conversation metadata without its messages.
//!
//! Deliberately never touches the message store; `last_message_id` is the
//! conversation's own back-reference.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::chat::{Conversation, ConversationId};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{ConversationRepository, RepositoryError};

/// Query for one conversation's metadata.
#[derive(Debug, Clone)]
pub struct GetConversationQuery {
    pub conversation_id: String,
}

/// Read model of a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub id: String,
    pub owner: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub last_message_id: Option<String>,
}

impl From<&Conversation> for ConversationView {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id().to_string(),
            owner: conversation.owner().to_string(),
            created_at: conversation.created_at(),
            updated_at: conversation.updated_at(),
            last_message_id: conversation.last_message_id().map(|id| id.to_string()),
        }
    }
}

/// Errors surfaced by the query.
#[derive(Debug, Error)]
pub enum GetConversationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Handler for reading conversation metadata.
pub struct GetConversationHandler {
    conversations: Arc<dyn ConversationRepository>,
}

impl GetConversationHandler {
    /// Creates the handler over a conversation repository.
    pub fn new(conversations: Arc<dyn ConversationRepository>) -> Self {
        Self { conversations }
    }

    /// Returns the conversation's metadata, or `None` when it does not exist.
    pub async fn handle(
        &self,
        query: GetConversationQuery,
    ) -> Result<Option<ConversationView>, GetConversationError> {
        let conversation_id = ConversationId::new(&query.conversation_id)?;
        let conversation = self.conversations.find_by_id(&conversation_id).await?;
        Ok(conversation.as_ref().map(ConversationView::from))
    }
}
