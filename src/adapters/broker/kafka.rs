//! Kafka transport over rdkafka.
//!
//! Maps [`BrokerConfig`] onto librdkafka client settings. Message keys are
//! aggregate ids, keeping per-aggregate ordering within a partition.

use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::BrokerConfig;
use crate::ports::BusError;

use super::transport::{BrokerConnector, BrokerConsumer, BrokerProducer, InboundMessage};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens rdkafka producer and consumer connections from broker settings.
pub struct KafkaConnector {
    config: BrokerConfig,
}

impl KafkaConnector {
    /// Creates a connector over the given settings.
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    fn producer_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new();
        client.set("bootstrap.servers", &self.config.bootstrap_servers);
        client.set("message.timeout.ms", "5000");
        client
    }

    fn consumer_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new();
        client.set("bootstrap.servers", &self.config.bootstrap_servers);
        client.set("group.id", &self.config.group_id);
        client.set("auto.offset.reset", &self.config.auto_offset_reset);
        client.set(
            "enable.auto.commit",
            if self.config.enable_auto_commit { "true" } else { "false" },
        );
        client.set(
            "session.timeout.ms",
            self.config.session_timeout_ms.to_string(),
        );
        client.set(
            "heartbeat.interval.ms",
            self.config.heartbeat_interval_ms.to_string(),
        );
        // max_poll_records is a Java-client batching knob with no librdkafka
        // equivalent; the stream consumer hands over one message at a time.
        client
    }
}

#[async_trait]
impl BrokerConnector for KafkaConnector {
    async fn producer(&self) -> Result<Arc<dyn BrokerProducer>, BusError> {
        let producer: FutureProducer = self
            .producer_config()
            .create()
            .map_err(|e| BusError::Unavailable(format!("failed to create producer: {}", e)))?;
        info!(
            bootstrap_servers = %self.config.bootstrap_servers,
            "Kafka producer connected"
        );
        Ok(Arc::new(KafkaProducer { producer }))
    }

    async fn consumer(&self) -> Result<Arc<dyn BrokerConsumer>, BusError> {
        let consumer: StreamConsumer = self
            .consumer_config()
            .create()
            .map_err(|e| BusError::Unavailable(format!("failed to create consumer: {}", e)))?;
        info!(
            group_id = %self.config.group_id,
            "Kafka consumer connected"
        );
        Ok(Arc::new(KafkaConsumer { consumer }))
    }
}

struct KafkaProducer {
    producer: FutureProducer,
}

#[async_trait]
impl BrokerProducer for KafkaProducer {
    async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), BusError> {
        let record = match key {
            Some(key) => FutureRecord::to(topic).payload(payload).key(key),
            None => FutureRecord::to(topic).payload(payload),
        };
        self.producer
            .send(record, SEND_TIMEOUT)
            .await
            .map_err(|(e, _)| BusError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) {
        let _ = self.producer.flush(SEND_TIMEOUT);
    }
}

struct KafkaConsumer {
    consumer: StreamConsumer,
}

#[async_trait]
impl BrokerConsumer for KafkaConsumer {
    async fn subscribe(&self, topics: &[String]) -> Result<(), BusError> {
        let refs: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.consumer
            .subscribe(&refs)
            .map_err(|e| BusError::Subscribe(e.to_string()))
    }

    async fn poll(&self, timeout: Duration) -> Result<Option<InboundMessage>, BusError> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => Ok(None),
            Ok(Err(e)) => Err(BusError::Unavailable(e.to_string())),
            Ok(Ok(message)) => Ok(Some(InboundMessage {
                topic: message.topic().to_string(),
                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            })),
        }
    }

    async fn close(&self) {
        self.consumer.unsubscribe();
    }
}
