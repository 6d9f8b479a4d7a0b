//! PaginateMessages - cursor-based read over a conversation's live messages.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::chat::{ConversationId, Message, MessageId};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{MessageRepository, RepositoryError};

/// Hard ceiling on page size, applied regardless of the requested value.
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Query for one page of a conversation's live messages.
#[derive(Debug, Clone)]
pub struct PaginateMessagesQuery {
    pub conversation_id: String,
    /// Id of the last message of the previous page, if any.
    pub cursor: Option<String>,
    /// Requested page size; clamped to [`MAX_PAGE_SIZE`].
    pub limit: Option<usize>,
}

/// Read model of one live message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id().to_string(),
            conversation_id: message.conversation_id().to_string(),
            content: message.content().to_string(),
            created_at: message.created_at(),
            updated_at: message.updated_at(),
        }
    }
}

/// One page of results.
///
/// `has_more` compares the page length against the effective limit; it
/// reports a false negative only when the remaining count exactly equals
/// the limit, which callers tolerate by issuing one extra request.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub messages: Vec<MessageView>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Errors surfaced by the pagination query.
#[derive(Debug, Error)]
pub enum PaginateMessagesError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Handler for paginating a conversation's messages.
pub struct PaginateMessagesHandler {
    messages: Arc<dyn MessageRepository>,
}

impl PaginateMessagesHandler {
    /// Creates the handler over a message repository.
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Returns one page, ordered by the repository's total order.
    ///
    /// A cursor matching no live message yields an empty page.
    pub async fn handle(
        &self,
        query: PaginateMessagesQuery,
    ) -> Result<MessagePage, PaginateMessagesError> {
        let conversation_id = ConversationId::new(&query.conversation_id)?;
        let cursor = query
            .cursor
            .as_deref()
            .map(MessageId::new)
            .transpose()?;
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

        let messages = self
            .messages
            .paginate_messages(&conversation_id, cursor.as_ref(), limit)
            .await?;

        let views: Vec<MessageView> = messages.iter().map(MessageView::from).collect();
        let next_cursor = views.last().map(|view| view.id.clone());
        let has_more = views.len() == limit;

        Ok(MessagePage {
            messages: views,
            next_cursor,
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMessageRepository;
    use crate::domain::chat::Content;

    async fn seeded(count: usize) -> Arc<InMemoryMessageRepository> {
        let repo = Arc::new(InMemoryMessageRepository::new());
        for i in 1..=count {
            let message = Message::create(
                MessageId::new(format!("m{:03}", i)).unwrap(),
                ConversationId::new("c1").unwrap(),
                Content::new(format!("message {}", i)).unwrap(),
            );
            repo.save(&message).await.unwrap();
        }
        repo
    }

    fn query(cursor: Option<&str>, limit: Option<usize>) -> PaginateMessagesQuery {
        PaginateMessagesQuery {
            conversation_id: "c1".to_string(),
            cursor: cursor.map(str::to_string),
            limit,
        }
    }

    #[tokio::test]
    async fn default_limit_is_twenty() {
        let handler = PaginateMessagesHandler::new(seeded(25).await);

        let page = handler.handle(query(None, None)).await.unwrap();

        assert_eq!(page.messages.len(), DEFAULT_PAGE_SIZE);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_maximum() {
        let handler = PaginateMessagesHandler::new(seeded(120).await);

        let page = handler.handle(query(None, Some(5000))).await.unwrap();

        assert_eq!(page.messages.len(), MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn page_starts_strictly_after_cursor() {
        let handler = PaginateMessagesHandler::new(seeded(5).await);

        let page = handler.handle(query(Some("m002"), Some(2))).await.unwrap();

        let ids: Vec<&str> = page.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m003", "m004"]);
        assert_eq!(page.next_cursor.as_deref(), Some("m004"));
    }

    #[tokio::test]
    async fn empty_page_has_no_cursor_and_no_more() {
        let handler = PaginateMessagesHandler::new(seeded(0).await);

        let page = handler.handle(query(None, Some(10))).await.unwrap();

        assert!(page.messages.is_empty());
        assert!(page.next_cursor.is_none());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn unknown_cursor_yields_empty_page() {
        let handler = PaginateMessagesHandler::new(seeded(5).await);

        let page = handler.handle(query(Some("ghost"), Some(10))).await.unwrap();

        assert!(page.messages.is_empty());
        assert!(page.next_cursor.is_none());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn invalid_conversation_id_is_rejected() {
        let handler = PaginateMessagesHandler::new(seeded(0).await);

        let result = handler
            .handle(PaginateMessagesQuery {
                conversation_id: "   ".to_string(),
                cursor: None,
                limit: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(PaginateMessagesError::Domain(DomainError::InvalidValue { .. }))
        ));
    }

    #[tokio::test]
    async fn following_cursors_visits_every_live_message_once() {
        let repo = seeded(23).await;
        let handler = PaginateMessagesHandler::new(repo);

        let mut collected: Vec<String> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = handler
                .handle(query(cursor.as_deref(), Some(7)))
                .await
                .unwrap();
            collected.extend(page.messages.iter().map(|m| m.id.clone()));
            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
        }

        let expected: Vec<String> = (1..=23).map(|i| format!("m{:03}", i)).collect();
        assert_eq!(collected, expected);
    }

    #[tokio::test]
    async fn has_more_false_negative_costs_one_extra_request() {
        // Remaining count exactly equals the limit: has_more stays true and
        // the next request returns an empty page.
        let handler = PaginateMessagesHandler::new(seeded(4).await);

        let page = handler.handle(query(None, Some(4))).await.unwrap();
        assert!(page.has_more);

        let next = handler
            .handle(query(page.next_cursor.as_deref(), Some(4)))
            .await
            .unwrap();
        assert!(next.messages.is_empty());
        assert!(!next.has_more);
    }
}
