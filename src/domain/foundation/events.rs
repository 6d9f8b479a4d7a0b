//! Domain event envelope and the pending-event buffer aggregates embed.
//!
//! - `EventId` - process-unique identity for an event instance
//! - `DomainEvent` - immutable record that something happened to an aggregate
//! - `EventRecorder` - per-aggregate buffer drained by `pull_events()`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use super::Timestamp;

/// Unique identifier for an event instance.
///
/// Backed by a string so identities survive serialization unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an EventId from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable record that something happened to an aggregate.
///
/// Identity and `occurred_on` are assigned at construction and never change.
/// Two events are equal iff their identities match; the kind, aggregate id,
/// and payload do not participate in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    event_id: EventId,
    kind: String,
    aggregate_id: Option<String>,
    occurred_on: Timestamp,
    payload: BTreeMap<String, String>,
}

impl DomainEvent {
    /// Creates a new event, stamping a fresh identity and the current time.
    pub fn new(
        kind: impl Into<String>,
        aggregate_id: Option<String>,
        payload: BTreeMap<String, String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            kind: kind.into(),
            aggregate_id,
            occurred_on: Timestamp::now(),
            payload,
        }
    }

    /// Rebuilds an event received from the wire.
    ///
    /// The wire envelope carries no identity, so a fresh one is stamped;
    /// identities are process-unique, not global.
    pub fn reconstruct(
        kind: impl Into<String>,
        aggregate_id: Option<String>,
        occurred_on: Timestamp,
        payload: BTreeMap<String, String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            kind: kind.into(),
            aggregate_id,
            occurred_on,
            payload,
        }
    }

    /// Returns the process-unique identity of this event instance.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Returns the event kind name (e.g. "message.created").
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the id of the aggregate that emitted this event, if any.
    pub fn aggregate_id(&self) -> Option<&str> {
        self.aggregate_id.as_deref()
    }

    /// Returns when the event occurred.
    pub fn occurred_on(&self) -> Timestamp {
        self.occurred_on
    }

    /// Returns the kind-specific key/value payload.
    pub fn payload(&self) -> &BTreeMap<String, String> {
        &self.payload
    }

    /// Looks up a single payload field.
    pub fn payload_value(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }
}

impl PartialEq for DomainEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event_id == other.event_id
    }
}

impl Eq for DomainEvent {}

impl Hash for DomainEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.event_id.hash(state);
    }
}

/// Ordered buffer of events an aggregate has recorded but not yet published.
///
/// Aggregates embed one of these and record into it as mutations occur.
/// `pull_events()` atomically drains the buffer, so a second pull returns
/// nothing until new events are recorded.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    pending: Vec<DomainEvent>,
}

impl EventRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the buffer.
    pub fn record(&mut self, event: DomainEvent) {
        self.pending.push(event);
    }

    /// Drains and returns all buffered events, oldest first.
    pub fn pull_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Returns true if any events are waiting to be pulled.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Read-only view of the buffer, for assertions.
    pub fn pending(&self) -> &[DomainEvent] {
        &self.pending
    }
}
