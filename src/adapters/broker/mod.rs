//! Broker adapter - event dissemination over a message broker.
//!
//! [`BrokerEventBus`] carries the lifecycle, routing, and dispatch logic;
//! the transport underneath is swappable: in-process channels for tests and
//! local runs, Kafka (behind the `kafka` feature) for deployments.

mod bus;
mod channel;
#[cfg(feature = "kafka")]
mod kafka;
mod manager;
mod transport;
mod wire;

pub use bus::{BrokerEventBus, BusState};
pub use channel::ChannelBroker;
#[cfg(feature = "kafka")]
pub use kafka::KafkaConnector;
pub use manager::EventBusManager;
pub use transport::{BrokerConnector, BrokerConsumer, BrokerProducer, InboundMessage};
pub use wire::WireEnvelope;
