//! EventBusManager - lifecycle wrapper honoring the global enable switch.
//!
//! When the broker is disabled by configuration, `start`, `stop`, and
//! `publish_events` all become no-ops, so the rest of the system runs
//! unchanged without a broker.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::foundation::DomainEvent;
use crate::ports::{BusError, EventBus};

/// Manages the event bus lifecycle for the application.
pub struct EventBusManager {
    bus: Arc<dyn EventBus>,
    enabled: bool,
    started: Mutex<bool>,
}

impl EventBusManager {
    /// Creates the manager; `enabled` comes from the broker configuration.
    pub fn new(bus: Arc<dyn EventBus>, enabled: bool) -> Self {
        Self {
            bus,
            enabled,
            started: Mutex::new(false),
        }
    }

    /// Starts the bus unless disabled or already started.
    pub async fn start(&self) -> Result<(), BusError> {
        if !self.enabled {
            info!("event bus disabled by configuration");
            return Ok(());
        }
        let mut started = self.started.lock().await;
        if !*started {
            self.bus.start().await?;
            *started = true;
        }
        Ok(())
    }

    /// Stops the bus unless disabled or never started.
    pub async fn stop(&self) -> Result<(), BusError> {
        if !self.enabled {
            return Ok(());
        }
        let mut started = self.started.lock().await;
        if *started {
            self.bus.stop().await?;
            *started = false;
        }
        Ok(())
    }

    /// Publishes events, starting the bus on demand.
    pub async fn publish_events(&self, events: &[DomainEvent]) -> Result<(), BusError> {
        if !self.enabled {
            debug!("event bus disabled, events not published");
            return Ok(());
        }
        {
            let mut started = self.started.lock().await;
            if !*started {
                warn!("event bus not started, starting on demand");
                self.bus.start().await?;
                *started = true;
            }
        }
        self.bus.publish(events).await
    }
}
