//! Application configuration module.
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `PARLANCE`
//! prefix; nested fields use `__` as the separator, e.g.
//! `PARLANCE__BROKER__TOPIC_PREFIX=staging`.

mod broker;
mod error;

pub use broker::BrokerConfig;
pub use error::{ConfigError, ValidationError};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Event broker configuration.
    #[serde(default)]
    pub broker: BrokerConfig,
}

impl AppConfig {
    /// Loads configuration from the environment.
    ///
    /// Reads a `.env` file when present (development convenience), then
    /// environment variables with the `PARLANCE` prefix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PARLANCE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates every configuration section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.broker.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_broker_section_is_enabled() {
        let config = AppConfig::default();
        assert!(config.broker.enabled);
        assert_eq!(config.broker.topic_prefix, "parlance");
    }
}
