//! EventDispatcher - hands pulled domain events to the bus.

use std::sync::Arc;

use crate::domain::foundation::DomainEvent;
use crate::ports::{BusError, EventBus};

/// Forwards batches of pulled events to the event bus.
///
/// A no-op on an empty batch; otherwise forwards in the batch's order.
/// Carries no retry logic of its own - retries and backoff belong to the
/// bus adapter or its caller.
pub struct EventDispatcher {
    bus: Arc<dyn EventBus>,
}

impl EventDispatcher {
    /// Creates a dispatcher over the given bus.
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// Publishes the events, preserving their order.
    pub async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), BusError> {
        if events.is_empty() {
            return Ok(());
        }
        self.bus.publish(&events).await
    }
}
