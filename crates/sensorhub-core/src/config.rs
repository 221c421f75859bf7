//! Configuration loading and typed config structures for Sensorhub.
//!
//! The canonical configuration lives in `sensorhub-config.yaml`. This
//! module defines strongly-typed structs that mirror the YAML structure
//! and provides a loader that reads, overrides from the environment, and
//! validates the file. Every default lives here; the rest of the crate
//! takes explicit values.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid environment override {name}: {reason}")]
    Env {
        /// The variable name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A value is out of its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `sensorhub-config.yaml`. All sections are
/// optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SensorhubConfig {
    /// MQTT broker connection and subscriptions.
    #[serde(default)]
    pub broker: BrokerConfig,

    /// History retention.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Query API bind address.
    #[serde(default)]
    pub api: ApiConfig,

    /// Live fan-out buffering.
    #[serde(default)]
    pub fanout: FanoutConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SensorhubConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `MQTT_HOST` / `MQTT_PORT` override `broker.host` / `broker.port`
    /// - `API_HOST` / `API_PORT` override `api.host` / `api.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::Env`] or [`ConfigError::Invalid`] for bad values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Same as [`SensorhubConfig::from_file`], minus I/O.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override connection settings with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if a port variable is not a valid port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("MQTT_HOST") {
            self.broker.host = val;
        }
        if let Some(port) = env_port("MQTT_PORT")? {
            self.broker.port = port;
        }
        if let Ok(val) = std::env::var("API_HOST") {
            self.api.host = val;
        }
        if let Some(port) = env_port("API_PORT")? {
            self.api.port = port;
        }
        Ok(())
    }

    /// Reject configurations the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention.sweep_period_secs == 0 {
            return Err(invalid("retention.sweep_period_secs must be at least 1"));
        }
        if self.retention.horizon_secs == 0 {
            return Err(invalid("retention.horizon_secs must be at least 1"));
        }
        if self.fanout.capacity == 0 {
            return Err(invalid("fanout.capacity must be at least 1"));
        }
        if self.broker.topics.is_empty() {
            return Err(invalid("broker.topics must list at least one pattern"));
        }
        if self.broker.host.is_empty() {
            return Err(invalid("broker.host must not be empty"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

fn env_port(name: &'static str) -> Result<Option<u16>, ConfigError> {
    parse_port(name, std::env::var(name).ok())
}

fn parse_port(name: &'static str, raw: Option<String>) -> Result<Option<u16>, ConfigError> {
    raw.map(|val| {
        val.parse().map_err(|e| ConfigError::Env {
            name,
            reason: format!("{val:?} is not a port: {e}"),
        })
    })
    .transpose()
}

/// MQTT broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrokerConfig {
    /// Broker host name or address.
    #[serde(default = "default_broker_host")]
    pub host: String,

    /// Broker TCP port.
    #[serde(default = "default_broker_port")]
    pub port: u16,

    /// Prefix of the MQTT client id; a random suffix is appended per run.
    #[serde(default = "default_client_id_prefix")]
    pub client_id_prefix: String,

    /// Subscription patterns.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    /// MQTT keep-alive interval in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Delay before reconnecting after a broker error, in seconds.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl BrokerConfig {
    /// Keep-alive interval as a [`Duration`].
    pub const fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Reconnect delay as a [`Duration`].
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            client_id_prefix: default_client_id_prefix(),
            topics: default_topics(),
            keep_alive_secs: default_keep_alive_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

/// History retention configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetentionConfig {
    /// Seconds between two sweeps.
    #[serde(default = "default_sweep_period_secs")]
    pub sweep_period_secs: u64,

    /// Maximum age of a history record, in seconds.
    #[serde(default = "default_horizon_secs")]
    pub horizon_secs: u64,
}

impl RetentionConfig {
    /// Sweep period as a [`Duration`].
    pub const fn sweep_period(&self) -> Duration {
        Duration::from_secs(self.sweep_period_secs)
    }

    /// Retention horizon as a [`Duration`].
    pub const fn horizon(&self) -> Duration {
        Duration::from_secs(self.horizon_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sweep_period_secs: default_sweep_period_secs(),
            horizon_secs: default_horizon_secs(),
        }
    }
}

/// Query API bind configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind to.
    #[serde(default = "default_api_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

/// Live fan-out configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FanoutConfig {
    /// Events buffered per subscriber before the oldest are dropped.
    #[serde(default = "default_fanout_capacity")]
    pub capacity: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            capacity: default_fanout_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_broker_host() -> String {
    "localhost".to_owned()
}

const fn default_broker_port() -> u16 {
    1883
}

fn default_client_id_prefix() -> String {
    "api_rest_".to_owned()
}

fn default_topics() -> Vec<String> {
    [
        "iot/parking/#",
        "iot/batiments/#",
        "iot/wifi/#",
        "iot/meteo/#",
        "iot/transport/#",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

const fn default_keep_alive_secs() -> u64 {
    30
}

const fn default_reconnect_delay_secs() -> u64 {
    5
}

const fn default_sweep_period_secs() -> u64 {
    3600
}

const fn default_horizon_secs() -> u64 {
    86_400
}

fn default_api_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_api_port() -> u16 {
    5000
}

const fn default_fanout_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SensorhubConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.topics.len(), 5);
        assert_eq!(config.retention.sweep_period(), Duration::from_secs(3600));
        assert_eq!(config.retention.horizon(), Duration::from_secs(86_400));
        assert_eq!(config.api.port, 5000);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
broker:
  host: "broker.campus.local"
  port: 1884
  client_id_prefix: "hub_"
  topics:
    - "iot/parking/#"
    - "iot/meteo/#"
  keep_alive_secs: 10
  reconnect_delay_secs: 2

retention:
  sweep_period_secs: 60
  horizon_secs: 600

api:
  host: "127.0.0.1"
  port: 8080

fanout:
  capacity: 32

logging:
  level: "debug"
"#;
        let config: SensorhubConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.broker.host, "broker.campus.local");
        assert_eq!(config.broker.port, 1884);
        assert_eq!(config.broker.client_id_prefix, "hub_");
        assert_eq!(config.broker.topics, vec!["iot/parking/#", "iot/meteo/#"]);
        assert_eq!(config.broker.reconnect_delay(), Duration::from_secs(2));
        assert_eq!(config.retention.sweep_period_secs, 60);
        assert_eq!(config.retention.horizon_secs, 600);
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.fanout.capacity, 32);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config: SensorhubConfig =
            serde_yml::from_str("retention:\n  horizon_secs: 120\n").unwrap();
        assert_eq!(config.retention.horizon_secs, 120);
        assert_eq!(config.retention.sweep_period_secs, 3600);
        assert_eq!(config.broker, BrokerConfig::default());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let yaml = include_str!("../../../sensorhub-config.yaml");
        let config: SensorhubConfig = serde_yml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, SensorhubConfig::default());
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let mut config = SensorhubConfig::default();
        config.retention.horizon_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn empty_topic_list_is_rejected() {
        let mut config = SensorhubConfig::default();
        config.broker.topics.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = SensorhubConfig::parse("retention: [1, 2");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn port_override_parses_or_reports_the_variable() {
        assert_eq!(parse_port("API_PORT", None).unwrap(), None);
        assert_eq!(parse_port("API_PORT", Some("8080".to_owned())).unwrap(), Some(8080));
        assert!(matches!(
            parse_port("MQTT_PORT", Some("http".to_owned())),
            Err(ConfigError::Env { name: "MQTT_PORT", .. })
        ));
        assert!(parse_port("MQTT_PORT", Some("70000".to_owned())).is_err());
    }
}
