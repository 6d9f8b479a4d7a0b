//! Ports - interfaces the application core consumes.
//!
//! Repositories persist aggregates; the event bus disseminates domain
//! events. Adapters provide the implementations.

mod conversation_repository;
mod event_bus;
mod message_repository;

pub use conversation_repository::ConversationRepository;
pub use event_bus::{BusError, EventBus, EventListener, ListenerError};
pub use message_repository::MessageRepository;

use thiserror::Error;

/// Failure inside a repository implementation.
///
/// Absence of a record is not an error; finds return `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("storage failure: {0}")]
    Storage(String),
}
