//! BrokerEventBus - the event bus adapter over a broker transport.
//!
//! Owns a producer connection and a lazily-started consumer. The consumer
//! opens exactly once: at `start()` when listeners were registered
//! beforehand, otherwise at the first registration while running. Topics
//! nobody listens to are never consumed.
//!
//! Delivery is at-least-once. Within one `publish` call events go out in
//! order; ordering across calls is not guaranteed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::domain::foundation::DomainEvent;
use crate::ports::{BusError, EventBus, EventListener};

use super::transport::{BrokerConnector, BrokerConsumer, BrokerProducer, InboundMessage};
use super::wire::WireEnvelope;

/// Lifecycle states of the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

type ListenerRegistry = RwLock<HashMap<String, Vec<Arc<dyn EventListener>>>>;

struct ConsumerHandle {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Event bus over a [`BrokerConnector`] transport.
pub struct BrokerEventBus {
    config: BrokerConfig,
    connector: Arc<dyn BrokerConnector>,
    state: Mutex<BusState>,
    producer: Mutex<Option<Arc<dyn BrokerProducer>>>,
    listeners: Arc<ListenerRegistry>,
    consumer: Mutex<Option<ConsumerHandle>>,
}

impl BrokerEventBus {
    /// Creates the bus; no connection is opened until `start()`.
    pub fn new(config: BrokerConfig, connector: Arc<dyn BrokerConnector>) -> Self {
        Self {
            config,
            connector,
            state: Mutex::new(BusState::Stopped),
            producer: Mutex::new(None),
            listeners: Arc::new(RwLock::new(HashMap::new())),
            consumer: Mutex::new(None),
        }
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> BusState {
        *self.state.lock().await
    }

    /// Starts the consumer if it is not running and listeners exist.
    ///
    /// Both call sites of the lazy policy (`start()` and listener
    /// registration) funnel through here, so the decision logic lives in
    /// one place. The consumer slot lock makes the start happen once.
    async fn ensure_consumer_started(&self) -> Result<(), BusError> {
        let mut slot = self.consumer.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        let topics = self.subscribed_topics();
        if topics.is_empty() {
            return Ok(());
        }

        let connection = self.connector.consumer().await?;
        connection.subscribe(&topics).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(consume_loop(
            connection,
            Arc::clone(&self.listeners),
            shutdown_rx,
            self.config.heartbeat_interval(),
        ));

        *slot = Some(ConsumerHandle {
            task,
            shutdown: shutdown_tx,
        });
        info!(?topics, "consumer started");
        Ok(())
    }

    /// Topic per registered event kind, in a stable order.
    fn subscribed_topics(&self) -> Vec<String> {
        let registry = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let mut topics: Vec<String> = registry
            .keys()
            .map(|kind| self.config.topic_for_kind(kind))
            .collect();
        topics.sort();
        topics
    }
}

#[async_trait]
impl EventBus for BrokerEventBus {
    async fn start(&self) -> Result<(), BusError> {
        {
            let mut state = self.state.lock().await;
            match *state {
                BusState::Running | BusState::Starting => {
                    debug!("event bus already running");
                    return Ok(());
                }
                BusState::Stopping => {
                    return Err(BusError::Unavailable("bus is stopping".to_string()));
                }
                BusState::Stopped => *state = BusState::Starting,
            }
        }

        let producer = match self.connector.producer().await {
            Ok(producer) => producer,
            Err(e) => {
                // Producer connection failure is fatal to startup.
                *self.state.lock().await = BusState::Stopped;
                return Err(e);
            }
        };
        *self.producer.lock().await = Some(producer);
        *self.state.lock().await = BusState::Running;
        info!(
            bootstrap_servers = %self.config.bootstrap_servers,
            topic_prefix = %self.config.topic_prefix,
            "event bus started"
        );

        // Listeners registered before start get their consumer now.
        self.ensure_consumer_started().await
    }

    async fn stop(&self) -> Result<(), BusError> {
        {
            let mut state = self.state.lock().await;
            match *state {
                BusState::Stopped | BusState::Stopping => return Ok(()),
                BusState::Starting | BusState::Running => *state = BusState::Stopping,
            }
        }

        if let Some(handle) = self.consumer.lock().await.take() {
            let _ = handle.shutdown.send(true);
            if let Err(e) = handle.task.await {
                warn!(error = %e, "consumption task did not exit cleanly");
            }
        }

        if let Some(producer) = self.producer.lock().await.take() {
            producer.close().await;
        }

        *self.state.lock().await = BusState::Stopped;
        info!("event bus stopped");
        Ok(())
    }

    async fn publish(&self, events: &[DomainEvent]) -> Result<(), BusError> {
        if *self.state.lock().await != BusState::Running {
            return Err(BusError::NotRunning);
        }
        let producer = self
            .producer
            .lock()
            .await
            .clone()
            .ok_or(BusError::NotRunning)?;

        for event in events {
            let payload = WireEnvelope::from_domain(event).encode()?;
            let topic = self.config.topic_for_kind(event.kind());
            producer.send(&topic, event.aggregate_id(), &payload).await?;
            debug!(kind = %event.kind(), topic = %topic, "event published");
        }
        Ok(())
    }

    /// Registers a listener for an event kind.
    ///
    /// The consumer's topic subscription is fixed when the consumer starts;
    /// kinds first registered after that point are dispatched only if their
    /// topic is already part of the subscription.
    async fn register_listener(
        &self,
        event_kind: &str,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), BusError> {
        {
            let mut registry = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
            registry
                .entry(event_kind.to_string())
                .or_default()
                .push(listener);
        }
        debug!(kind = %event_kind, "listener registered");

        if *self.state.lock().await == BusState::Running {
            self.ensure_consumer_started().await?;
        }
        Ok(())
    }
}

async fn consume_loop(
    connection: Arc<dyn BrokerConsumer>,
    listeners: Arc<ListenerRegistry>,
    mut shutdown: watch::Receiver<bool>,
    poll_interval: Duration,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            polled = connection.poll(poll_interval) => {
                match polled {
                    Ok(Some(message)) => dispatch(&listeners, &message).await,
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "consumer poll failed"),
                }
            }
        }
    }
    connection.close().await;
    debug!("consumption loop exited");
}

/// Decodes one inbound message and fans it out to matching listeners.
///
/// A decode failure drops the single message; a listener failure is logged
/// and delivery to the remaining listeners continues.
async fn dispatch(listeners: &ListenerRegistry, message: &InboundMessage) {
    let envelope = match WireEnvelope::decode(&message.payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(topic = %message.topic, error = %e, "dropping undecodable message");
            return;
        }
    };
    let event = envelope.into_domain();

    // Snapshot matching listeners so the lock is released before any await.
    let matching: Vec<Arc<dyn EventListener>> = {
        let registry = listeners.read().unwrap_or_else(PoisonError::into_inner);
        registry.get(event.kind()).cloned().unwrap_or_default()
    };

    if matching.is_empty() {
        debug!(kind = %event.kind(), "no listener registered for event kind");
        return;
    }

    for listener in matching {
        if let Err(e) = listener.handle(event.clone()).await {
            warn!(
                listener = listener.name(),
                kind = %event.kind(),
                error = %e,
                "listener failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex as StdMutex;

    use crate::adapters::broker::channel::ChannelBroker;
    use crate::ports::ListenerError;

    fn test_config() -> BrokerConfig {
        BrokerConfig {
            heartbeat_interval_ms: 20,
            ..Default::default()
        }
    }

    fn event(kind: &str, aggregate: &str) -> DomainEvent {
        let mut payload = BTreeMap::new();
        payload.insert("aggregate".to_string(), aggregate.to_string());
        DomainEvent::new(kind, Some(aggregate.to_string()), payload)
    }

    /// Listener that records every event it sees.
    #[derive(Default)]
    struct Recording {
        seen: StdMutex<Vec<DomainEvent>>,
    }

    impl Recording {
        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EventListener for Recording {
        async fn handle(&self, event: DomainEvent) -> Result<(), ListenerError> {
            self.seen.lock().unwrap().push(event);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Recording"
        }
    }

    /// Listener that fails on its first invocation, then records.
    struct FlakyOnce {
        failed: StdMutex<bool>,
        seen: StdMutex<Vec<DomainEvent>>,
    }

    impl FlakyOnce {
        fn new() -> Self {
            Self {
                failed: StdMutex::new(false),
                seen: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EventListener for FlakyOnce {
        async fn handle(&self, event: DomainEvent) -> Result<(), ListenerError> {
            let mut failed = self.failed.lock().unwrap();
            if !*failed {
                *failed = true;
                return Err("first delivery rejected".into());
            }
            self.seen.lock().unwrap().push(event);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "FlakyOnce"
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    /// Connector whose producer cannot be opened.
    struct UnreachableBroker;

    #[async_trait]
    impl super::BrokerConnector for UnreachableBroker {
        async fn producer(&self) -> Result<Arc<dyn BrokerProducer>, BusError> {
            Err(BusError::Unavailable("connection refused".to_string()))
        }

        async fn consumer(&self) -> Result<Arc<dyn BrokerConsumer>, BusError> {
            Err(BusError::Unavailable("connection refused".to_string()))
        }
    }

    /// Connector whose producer accepts a connection but fails every send.
    struct FlakySendBroker;

    struct FailingProducer;

    #[async_trait]
    impl BrokerProducer for FailingProducer {
        async fn send(
            &self,
            _topic: &str,
            _key: Option<&str>,
            _payload: &[u8],
        ) -> Result<(), BusError> {
            Err(BusError::Publish("broker rejected the record".to_string()))
        }

        async fn close(&self) {}
    }

    #[async_trait]
    impl super::BrokerConnector for FlakySendBroker {
        async fn producer(&self) -> Result<Arc<dyn BrokerProducer>, BusError> {
            Ok(Arc::new(FailingProducer))
        }

        async fn consumer(&self) -> Result<Arc<dyn BrokerConsumer>, BusError> {
            Err(BusError::Unavailable("no consumer side".to_string()))
        }
    }

    #[tokio::test]
    async fn start_transitions_to_running_and_is_idempotent() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        assert_eq!(bus.state().await, BusState::Stopped);

        bus.start().await.unwrap();
        assert_eq!(bus.state().await, BusState::Running);

        bus.start().await.unwrap();
        assert_eq!(bus.state().await, BusState::Running);
    }

    #[tokio::test]
    async fn publish_before_start_is_rejected() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        let result = bus.publish(&[event("message.created", "m1")]).await;
        assert!(matches!(result, Err(BusError::NotRunning)));
    }

    #[tokio::test]
    async fn consumer_stays_closed_without_listeners() {
        let broker = ChannelBroker::new();
        let bus = BrokerEventBus::new(test_config(), broker.clone());

        bus.start().await.unwrap();
        bus.publish(&[event("message.created", "m1")]).await.unwrap();

        assert!(!broker.consumer_opened());
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn listeners_registered_before_start_get_a_consumer_at_start() {
        let broker = ChannelBroker::new();
        let bus = BrokerEventBus::new(test_config(), broker.clone());
        let listener = Arc::new(Recording::default());

        bus.register_listener("message.created", listener.clone())
            .await
            .unwrap();
        assert!(!broker.consumer_opened());

        bus.start().await.unwrap();
        assert!(broker.consumer_opened());

        bus.publish(&[event("message.created", "m1")]).await.unwrap();
        wait_until(|| listener.count() == 1).await;
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn registration_while_running_starts_the_consumer_lazily() {
        let broker = ChannelBroker::new();
        let bus = BrokerEventBus::new(test_config(), broker.clone());

        bus.start().await.unwrap();
        assert!(!broker.consumer_opened());

        let listener = Arc::new(Recording::default());
        bus.register_listener("message.created", listener.clone())
            .await
            .unwrap();
        assert!(broker.consumer_opened());

        bus.publish(&[event("message.created", "m1")]).await.unwrap();
        wait_until(|| listener.count() == 1).await;
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn every_listener_of_a_kind_is_invoked() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        let first = Arc::new(Recording::default());
        let second = Arc::new(Recording::default());

        bus.register_listener("message.created", first.clone())
            .await
            .unwrap();
        bus.register_listener("message.created", second.clone())
            .await
            .unwrap();
        bus.start().await.unwrap();

        bus.publish(&[event("message.created", "m1")]).await.unwrap();

        wait_until(|| first.count() == 1 && second.count() == 1).await;
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn listener_failure_does_not_block_later_deliveries() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        let flaky = Arc::new(FlakyOnce::new());

        bus.register_listener("message.created", flaky.clone())
            .await
            .unwrap();
        bus.start().await.unwrap();

        bus.publish(&[event("message.created", "m1"), event("message.created", "m2")])
            .await
            .unwrap();

        // First delivery fails inside the listener; the second still lands.
        wait_until(|| flaky.seen.lock().unwrap().len() == 1).await;
        assert_eq!(
            flaky.seen.lock().unwrap()[0].payload_value("aggregate"),
            Some("m2")
        );
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn failing_listener_does_not_starve_its_peers() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        let flaky = Arc::new(FlakyOnce::new());
        let steady = Arc::new(Recording::default());

        bus.register_listener("message.created", flaky).await.unwrap();
        bus.register_listener("message.created", steady.clone())
            .await
            .unwrap();
        bus.start().await.unwrap();

        bus.publish(&[event("message.created", "m1")]).await.unwrap();

        wait_until(|| steady.count() == 1).await;
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn undecodable_message_is_skipped_not_fatal() {
        let broker = ChannelBroker::new();
        let bus = BrokerEventBus::new(test_config(), broker.clone());
        let listener = Arc::new(Recording::default());

        bus.register_listener("message.created", listener.clone())
            .await
            .unwrap();
        bus.start().await.unwrap();

        broker.inject("parlance.message_created", b"{not json".to_vec());
        bus.publish(&[event("message.created", "m1")]).await.unwrap();

        wait_until(|| listener.count() == 1).await;
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn reconstructed_event_carries_kind_and_payload() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        let listener = Arc::new(Recording::default());

        bus.register_listener("conversation.truncated", listener.clone())
            .await
            .unwrap();
        bus.start().await.unwrap();

        let mut payload = BTreeMap::new();
        payload.insert("conversation_id".to_string(), "c1".to_string());
        payload.insert("from_message_id".to_string(), "m1".to_string());
        let outbound =
            DomainEvent::new("conversation.truncated", Some("c1".to_string()), payload);
        bus.publish(std::slice::from_ref(&outbound)).await.unwrap();

        wait_until(|| listener.count() == 1).await;
        let received = listener.seen.lock().unwrap()[0].clone();
        assert_eq!(received.kind(), "conversation.truncated");
        assert_eq!(received.aggregate_id(), Some("c1"));
        assert_eq!(received.payload_value("from_message_id"), Some("m1"));
        assert_eq!(received.occurred_on(), outbound.occurred_on());
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_safe_when_never_started() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        bus.stop().await.unwrap();
        assert_eq!(bus.state().await, BusState::Stopped);

        bus.start().await.unwrap();
        bus.stop().await.unwrap();
        bus.stop().await.unwrap();
        assert_eq!(bus.state().await, BusState::Stopped);
    }

    #[tokio::test]
    async fn stop_terminates_the_consumption_loop() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        let listener = Arc::new(Recording::default());
        bus.register_listener("message.created", listener.clone())
            .await
            .unwrap();
        bus.start().await.unwrap();

        bus.stop().await.unwrap();

        // Publishing after stop is rejected; nothing reaches the listener.
        let result = bus.publish(&[event("message.created", "m1")]).await;
        assert!(matches!(result, Err(BusError::NotRunning)));
        assert_eq!(listener.count(), 0);
    }

    #[tokio::test]
    async fn producer_connection_failure_is_fatal_to_start() {
        let bus = BrokerEventBus::new(test_config(), Arc::new(UnreachableBroker));

        let result = bus.start().await;

        assert!(matches!(result, Err(BusError::Unavailable(_))));
        assert_eq!(bus.state().await, BusState::Stopped);
    }

    #[tokio::test]
    async fn transient_publish_failure_surfaces_to_the_caller() {
        let bus = BrokerEventBus::new(test_config(), Arc::new(FlakySendBroker));
        bus.start().await.unwrap();

        let result = bus.publish(&[event("message.created", "m1")]).await;

        // No built-in retry; the caller decides what to do.
        assert!(matches!(result, Err(BusError::Publish(_))));
        assert_eq!(bus.state().await, BusState::Running);
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn restart_after_stop_reopens_the_producer() {
        let bus = BrokerEventBus::new(test_config(), ChannelBroker::new());
        bus.start().await.unwrap();
        bus.stop().await.unwrap();

        bus.start().await.unwrap();
        assert_eq!(bus.state().await, BusState::Running);
        bus.publish(&[event("message.created", "m1")]).await.unwrap();
        bus.stop().await.unwrap();
    }
}
