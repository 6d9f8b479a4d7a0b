//! Message repository port.

use async_trait::async_trait;

use crate::domain::chat::{ConversationId, Message, MessageId};

use super::RepositoryError;

/// Persistence contract for Message aggregates.
///
/// The repository owns the total order over a conversation's messages -
/// `(created_at, id)` - and both `find_messages_after` and
/// `paginate_messages` must use it consistently. Soft-deleted messages are
/// excluded from every ordered read.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Finds a message by id. Absence is `Ok(None)`; deleted messages are
    /// still found here (the flag is part of the aggregate).
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError>;

    /// Saves a message, inserting or replacing by id.
    async fn save(&self, message: &Message) -> Result<(), RepositoryError>;

    /// Returns ids of live messages strictly after `message_id` in the
    /// conversation's total order.
    async fn find_messages_after(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<Vec<MessageId>, RepositoryError>;

    /// Marks the given messages as deleted. Unknown ids are skipped.
    async fn soft_delete_messages(&self, ids: &[MessageId]) -> Result<(), RepositoryError>;

    /// Returns up to `limit` live messages of the conversation, in the total
    /// order, starting strictly after the message whose id equals `cursor`
    /// (from the beginning when `cursor` is `None`). A cursor matching no
    /// message yields an empty result.
    async fn paginate_messages(
        &self,
        conversation_id: &ConversationId,
        cursor: Option<&MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn MessageRepository) {}
    }
}
