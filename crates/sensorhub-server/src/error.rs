//! Error types for the Sensorhub service binary.
//!
//! [`ServiceError`] is the top-level error that wraps every failure mode
//! during startup. [`MqttError`] covers one broker session; the
//! subscriber logs it and reconnects rather than propagating it.

/// Top-level error for the service binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: sensorhub_core::config::ConfigError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: sensorhub_observer::startup::StartupError,
    },

    /// Installing the Ctrl-C handler failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Failure of a single MQTT broker session.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// A subscribe request could not be queued.
    #[error("failed to subscribe to {topic}: {source}")]
    Subscribe {
        /// The topic filter.
        topic: String,
        /// The client error.
        source: rumqttc::ClientError,
    },

    /// The event loop lost or could not establish the connection.
    #[error("MQTT event loop error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),
}
