//! Wire envelope for events crossing the broker.
//!
//! JSON with four fields: `event_kind`, `aggregate_id`, `occurred_on`,
//! `payload`. The event identity stays process-local and is not carried;
//! the consuming side stamps a fresh one on reconstruction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{DomainEvent, Timestamp};
use crate::ports::BusError;

/// Serialized form of a domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    pub event_kind: String,
    pub aggregate_id: Option<String>,
    pub occurred_on: Timestamp,
    pub payload: BTreeMap<String, String>,
}

impl WireEnvelope {
    /// Builds the wire form of a domain event.
    pub fn from_domain(event: &DomainEvent) -> Self {
        Self {
            event_kind: event.kind().to_string(),
            aggregate_id: event.aggregate_id().map(str::to_string),
            occurred_on: event.occurred_on(),
            payload: event.payload().clone(),
        }
    }

    /// Reconstructs a domain event, stamping a fresh process-local identity.
    pub fn into_domain(self) -> DomainEvent {
        DomainEvent::reconstruct(
            self.event_kind,
            self.aggregate_id,
            self.occurred_on,
            self.payload,
        )
    }

    /// Encodes to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, BusError> {
        serde_json::to_vec(self).map_err(|e| BusError::Serialization(e.to_string()))
    }

    /// Decodes from JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, BusError> {
        serde_json::from_slice(bytes).map_err(|e| BusError::Serialization(e.to_string()))
    }
}
