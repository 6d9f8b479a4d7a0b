//! Conversation repository port.

use async_trait::async_trait;

use crate::domain::chat::{Conversation, ConversationId};

use super::RepositoryError;

/// Persistence contract for Conversation aggregates.
///
/// Implementations persist aggregate state only; pending domain events stay
/// with the caller's aggregate and are published separately.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Finds a conversation by id. Absence is `Ok(None)`.
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Saves a conversation, inserting or replacing by id.
    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError>;
}
