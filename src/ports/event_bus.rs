//! Event bus port - publishing and listener registration.
//!
//! The bus delivers at-least-once: listeners may see duplicates and must be
//! idempotent. Ordering holds per publish call, not across calls.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::DomainEvent;

/// Error returned by a listener invocation.
///
/// The bus catches and logs these; they never stop the consumption loop or
/// block delivery to other listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced by the event bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// Broker connection could not be established or was lost.
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// Publish attempted while the bus is not running.
    #[error("event bus is not running")]
    NotRunning,

    /// A single publish failed in transit; the caller decides on retry.
    #[error("failed to publish event: {0}")]
    Publish(String),

    /// Consumer-side subscription failed.
    #[error("failed to subscribe: {0}")]
    Subscribe(String),

    /// An outbound event could not be encoded.
    #[error("event serialization failed: {0}")]
    Serialization(String),
}

/// Receives reconstructed events from the consumption loop.
///
/// Implementations should be idempotent (duplicates are possible) and
/// quick; long work belongs on a queue of its own.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Processes one event.
    async fn handle(&self, event: DomainEvent) -> Result<(), ListenerError>;

    /// Listener name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Port for disseminating domain events through a broker.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Opens the producer connection. The consumer side starts lazily: at
    /// `start` when listeners were registered beforehand, otherwise at the
    /// first registration while running.
    async fn start(&self) -> Result<(), BusError>;

    /// Stops consumption, then closes consumer and producer connections.
    /// Idempotent; safe to call when never started.
    async fn stop(&self) -> Result<(), BusError>;

    /// Publishes events in order. Within one call, event *i* is sent before
    /// event *i+1*; ordering across calls is not guaranteed.
    async fn publish(&self, events: &[DomainEvent]) -> Result<(), BusError>;

    /// Registers a listener for an event kind. Multiple listeners per kind
    /// are permitted and all are invoked on matching delivery.
    async fn register_listener(
        &self,
        event_kind: &str,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), BusError>;
}
