//! In-process transport over tokio channels.
//!
//! Deterministic stand-in for a real broker: one queue, topic filtering on
//! the consumer side. Backs the test suite and broker-less local runs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{timeout_at, Instant};

use crate::ports::BusError;

use super::transport::{BrokerConnector, BrokerConsumer, BrokerProducer, InboundMessage};

/// Connector handing out channel-backed producer and consumer halves.
pub struct ChannelBroker {
    tx: mpsc::UnboundedSender<InboundMessage>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<InboundMessage>>>,
    consumer_taken: AtomicBool,
}

impl ChannelBroker {
    /// Creates a fresh in-process broker.
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            tx,
            rx: Mutex::new(Some(rx)),
            consumer_taken: AtomicBool::new(false),
        })
    }

    /// Returns true once the consumer connection was opened. Lets tests
    /// observe the bus's lazy consumer policy.
    pub fn consumer_opened(&self) -> bool {
        self.consumer_taken.load(Ordering::SeqCst)
    }

    /// Injects a raw payload, bypassing any producer. Lets tests exercise
    /// the consumption path with arbitrary bytes.
    pub fn inject(&self, topic: &str, payload: Vec<u8>) {
        let _ = self.tx.send(InboundMessage {
            topic: topic.to_string(),
            payload,
        });
    }
}

#[async_trait]
impl BrokerConnector for ChannelBroker {
    async fn producer(&self) -> Result<Arc<dyn BrokerProducer>, BusError> {
        Ok(Arc::new(ChannelProducer {
            tx: self.tx.clone(),
        }))
    }

    async fn consumer(&self) -> Result<Arc<dyn BrokerConsumer>, BusError> {
        let rx = self
            .rx
            .lock()
            .await
            .take()
            .ok_or_else(|| BusError::Unavailable("channel consumer already opened".to_string()))?;
        self.consumer_taken.store(true, Ordering::SeqCst);
        Ok(Arc::new(ChannelConsumer {
            rx: Mutex::new(rx),
            topics: RwLock::new(HashSet::new()),
        }))
    }
}

struct ChannelProducer {
    tx: mpsc::UnboundedSender<InboundMessage>,
}

#[async_trait]
impl BrokerProducer for ChannelProducer {
    async fn send(
        &self,
        topic: &str,
        _key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), BusError> {
        self.tx
            .send(InboundMessage {
                topic: topic.to_string(),
                payload: payload.to_vec(),
            })
            .map_err(|e| BusError::Publish(e.to_string()))
    }

    async fn close(&self) {}
}

struct ChannelConsumer {
    rx: Mutex<mpsc::UnboundedReceiver<InboundMessage>>,
    topics: RwLock<HashSet<String>>,
}

impl ChannelConsumer {
    fn is_subscribed(&self, topic: &str) -> bool {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(topic)
    }
}

#[async_trait]
impl BrokerConsumer for ChannelConsumer {
    async fn subscribe(&self, topics: &[String]) -> Result<(), BusError> {
        let mut subscribed = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        subscribed.extend(topics.iter().cloned());
        Ok(())
    }

    async fn poll(&self, timeout: Duration) -> Result<Option<InboundMessage>, BusError> {
        let deadline = Instant::now() + timeout;
        let mut rx = self.rx.lock().await;
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Err(_) => return Ok(None),
                Ok(None) => return Ok(None),
                Ok(Some(message)) => {
                    // A real broker would never hand over unsubscribed
                    // topics; the filter emulates that.
                    if self.is_subscribed(&message.topic) {
                        return Ok(Some(message));
                    }
                }
            }
        }
    }

    async fn close(&self) {}
}
