//! Transport seam under the event bus.
//!
//! The bus owns lifecycle, routing, and dispatch; these traits own the raw
//! connections. The in-process channel transport backs tests and local
//! runs, the Kafka transport backs deployments.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::BusError;

/// A raw message pulled from a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Producer side of a broker connection.
///
/// Implementations must be safe for concurrent `send` calls; the bus does
/// not serialize publishers.
#[async_trait]
pub trait BrokerProducer: Send + Sync {
    /// Sends one payload to a topic. The key, when present, partitions
    /// deliveries so events of one aggregate stay ordered.
    async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), BusError>;

    /// Flushes and releases the connection.
    async fn close(&self);
}

/// Consumer side of a broker connection.
#[async_trait]
pub trait BrokerConsumer: Send + Sync {
    /// Subscribes the consumer to the given topics.
    async fn subscribe(&self, topics: &[String]) -> Result<(), BusError>;

    /// Waits up to `timeout` for the next message. `Ok(None)` on timeout,
    /// which is how the consumption loop stays responsive to shutdown.
    async fn poll(&self, timeout: Duration) -> Result<Option<InboundMessage>, BusError>;

    /// Releases the connection.
    async fn close(&self);
}

/// Opens producer and consumer connections on demand.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// Opens the producer connection.
    async fn producer(&self) -> Result<Arc<dyn BrokerProducer>, BusError>;

    /// Opens the consumer connection.
    async fn consumer(&self) -> Result<Arc<dyn BrokerConsumer>, BusError>;
}
