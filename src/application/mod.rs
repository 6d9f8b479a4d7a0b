//! Application layer - use cases orchestrating the domain over the ports.

mod dispatcher;
mod get_conversation;
mod paginate_messages;
mod upsert_message;

pub use dispatcher::EventDispatcher;
pub use get_conversation::{ConversationView, GetConversationError, GetConversationHandler, GetConversationQuery};
pub use paginate_messages::{
    MessagePage, MessageView, PaginateMessagesError, PaginateMessagesHandler,
    PaginateMessagesQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use upsert_message::{UpsertMessageCommand, UpsertMessageError, UpsertMessageHandler};
