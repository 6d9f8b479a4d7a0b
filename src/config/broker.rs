//! Broker configuration.
//!
//! The operator surface of the event bus: connection, consumer tuning, and
//! the global enable switch. When `enabled` is off the bus manager turns
//! `start`/`stop`/`publish` into no-ops.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Broker connection and consumer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Broker bootstrap addresses, comma-separated.
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    /// Prefix for every topic this service produces or consumes.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Consumer group id.
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Offset policy for a group without a committed offset.
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,

    /// Whether consumed offsets are committed automatically.
    #[serde(default = "default_true")]
    pub enable_auto_commit: bool,

    /// Upper bound on records returned per poll batch.
    #[serde(default = "default_max_poll_records")]
    pub max_poll_records: u32,

    /// Consumer session timeout in milliseconds.
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Consumer heartbeat interval in milliseconds. Also bounds how quickly
    /// the consumption loop notices a stop signal.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Global switch; off makes the bus manager a no-op.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl BrokerConfig {
    /// Topic for an event kind: `{prefix}.{kind with '.' replaced by '_'}`.
    pub fn topic_for_kind(&self, event_kind: &str) -> String {
        format!("{}.{}", self.topic_prefix, event_kind.replace('.', "_"))
    }

    /// Heartbeat interval as a Duration.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Session timeout as a Duration.
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    /// Validates the broker configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bootstrap_servers.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_BOOTSTRAP_SERVERS"));
        }
        if self.topic_prefix.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_TOPIC_PREFIX"));
        }
        if self.group_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_GROUP_ID"));
        }
        if !matches!(self.auto_offset_reset.as_str(), "earliest" | "latest" | "none") {
            return Err(ValidationError::invalid(
                "auto_offset_reset",
                "must be one of: earliest, latest, none",
            ));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ValidationError::invalid(
                "heartbeat_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.heartbeat_interval_ms >= self.session_timeout_ms {
            return Err(ValidationError::invalid(
                "heartbeat_interval_ms",
                "must be below the session timeout",
            ));
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: default_bootstrap_servers(),
            topic_prefix: default_topic_prefix(),
            group_id: default_group_id(),
            auto_offset_reset: default_auto_offset_reset(),
            enable_auto_commit: true,
            max_poll_records: default_max_poll_records(),
            session_timeout_ms: default_session_timeout_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            enabled: true,
        }
    }
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

fn default_topic_prefix() -> String {
    "parlance".to_string()
}

fn default_group_id() -> String {
    "parlance-app".to_string()
}

fn default_auto_offset_reset() -> String {
    "earliest".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_poll_records() -> u32 {
    500
}

fn default_session_timeout_ms() -> u64 {
    30_000
}

fn default_heartbeat_interval_ms() -> u64 {
    3_000
}
