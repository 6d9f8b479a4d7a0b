//! UpsertMessage - the transactional create-or-update use case.
//!
//! Creates the conversation on first contact, creates or updates the
//! message, soft-deletes everything chronologically after an updated
//! message, and publishes the domain events both aggregates recorded.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::dispatcher::EventDispatcher;
use crate::domain::chat::{
    Content, Conversation, ConversationId, Message, MessageChronology, MessageId, Owner,
};
use crate::domain::foundation::DomainError;
use crate::ports::{BusError, ConversationRepository, MessageRepository, RepositoryError};

/// Command to create or update a message in a conversation.
#[derive(Debug, Clone)]
pub struct UpsertMessageCommand {
    pub conversation_id: String,
    pub message_id: String,
    pub content: String,
    pub owner: String,
}

/// Errors surfaced by the upsert use case.
///
/// Validation and identity errors occur before any mutation. Bus errors
/// occur after aggregates were persisted - persistence and publication are
/// not one transaction.
#[derive(Debug, Error)]
pub enum UpsertMessageError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Orchestrates the upsert across both aggregates.
pub struct UpsertMessageHandler {
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    chronology: MessageChronology,
    dispatcher: EventDispatcher,
}

impl UpsertMessageHandler {
    /// Creates the handler over its collaborators.
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        chronology: MessageChronology,
        dispatcher: EventDispatcher,
    ) -> Self {
        Self {
            conversations,
            messages,
            chronology,
            dispatcher,
        }
    }

    /// Executes the upsert.
    ///
    /// # Errors
    ///
    /// - `Domain(InvalidValue)` on malformed input, before any mutation
    /// - `Domain(IdentityConflict)` when the message already exists under a
    ///   different conversation
    /// - `Repository` / `Bus` failures from the collaborators
    pub async fn handle(&self, command: UpsertMessageCommand) -> Result<(), UpsertMessageError> {
        let conversation_id = ConversationId::new(&command.conversation_id)?;
        let message_id = MessageId::new(&command.message_id)?;
        let content = Content::new(&command.content)?;
        let owner = Owner::new(&command.owner)?;

        let mut conversation = self.get_or_create_conversation(&conversation_id, owner).await?;

        let mut message = match self.messages.find_by_id(&message_id).await? {
            Some(mut existing) => {
                // An id refers to one logical message forever.
                if existing.conversation_id() != &conversation_id {
                    return Err(DomainError::identity_conflict(
                        message_id.as_str(),
                        existing.conversation_id().as_str(),
                        conversation_id.as_str(),
                    )
                    .into());
                }

                existing.update_content(content);

                let trailing = self
                    .chronology
                    .messages_after(&conversation_id, &message_id)
                    .await?;
                if !trailing.is_empty() {
                    debug!(
                        conversation_id = %conversation_id,
                        from_message_id = %message_id,
                        truncated = trailing.len(),
                        "truncating messages after updated message"
                    );
                    self.messages.soft_delete_messages(&trailing).await?;
                    conversation.record_truncated(&message_id);
                }

                existing
            }
            None => Message::create(message_id.clone(), conversation_id.clone(), content),
        };

        conversation.update_last_message(message_id);

        self.conversations.save(&conversation).await?;
        self.messages.save(&message).await?;

        // Conversation events first, then message events.
        self.dispatcher.publish(conversation.pull_events()).await?;
        self.dispatcher.publish(message.pull_events()).await?;

        Ok(())
    }

    async fn get_or_create_conversation(
        &self,
        conversation_id: &ConversationId,
        owner: Owner,
    ) -> Result<Conversation, UpsertMessageError> {
        // The owner of an existing conversation is never changed, even when
        // the command supplies a different value.
        match self.conversations.find_by_id(conversation_id).await? {
            Some(existing) => Ok(existing),
            None => Ok(Conversation::create(conversation_id.clone(), owner)),
        }
    }
}
