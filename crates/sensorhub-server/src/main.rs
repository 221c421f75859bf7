//! Sensorhub service binary.
//!
//! Wires the MQTT subscriber, the ingest pipeline, the retention sweeper
//! and the Observer API around one shared [`SensorStore`], then runs until
//! Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `sensorhub-config.yaml` (or `SENSORHUB_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the store, clock, fan-out and ingest pipeline
//! 4. Spawn the retention sweeper
//! 5. Start the Observer API server
//! 6. Spawn the MQTT subscriber
//! 7. Wait for Ctrl-C, cancel every task and wait for them to drain

mod error;
mod mqtt;

use std::path::PathBuf;
use std::sync::Arc;

use sensorhub_core::config::SensorhubConfig;
use sensorhub_core::{
    Clock, FanOut, Ingestor, RetentionSweeper, SensorStore, SweepConfig, SystemClock, TopicRouter,
};
use sensorhub_observer::server::ServerConfig;
use sensorhub_observer::startup::spawn_observer;
use sensorhub_observer::state::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServiceError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "sensorhub-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the API cannot bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember where it came from.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("sensorhub-server starting");
    info!(
        source = %source,
        broker = %format!("{}:{}", config.broker.host, config.broker.port),
        api = %format!("{}:{}", config.api.host, config.api.port),
        sweep_period_secs = config.retention.sweep_period_secs,
        horizon_secs = config.retention.horizon_secs,
        "Configuration loaded"
    );

    // 3. Core components.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(SensorStore::new());
    let fanout = FanOut::new(config.fanout.capacity);
    let ingestor = Ingestor::new(
        TopicRouter::new(Arc::clone(&clock)),
        Arc::clone(&store),
        fanout.clone(),
    );
    let token = CancellationToken::new();

    // 4. Retention sweeper.
    let sweeper = RetentionSweeper::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        SweepConfig {
            period: config.retention.sweep_period(),
            horizon: config.retention.horizon(),
        },
    );
    let sweeper_handle = tokio::spawn(sweeper.run(token.child_token()));

    // 5. Observer API.
    let app_state = Arc::new(AppState::new(
        Arc::clone(&store),
        fanout,
        ingestor.stats(),
        clock,
    ));
    let observer = spawn_observer(
        &ServerConfig::from(&config.api),
        app_state,
        token.child_token(),
    )
    .await
    .map_err(ServiceError::from)?;
    info!(addr = %observer.local_addr, "Observer API server started");

    // 6. MQTT ingestion.
    let mqtt_handle = tokio::spawn(mqtt::run_mqtt_subscriber(
        config.broker.clone(),
        ingestor,
        token.child_token(),
    ));

    // 7. Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(ServiceError::from)?;
    info!("Shutdown requested");
    token.cancel();

    for (name, handle) in [
        ("mqtt", mqtt_handle),
        ("observer", observer.handle),
        ("sweeper", sweeper_handle),
    ] {
        if let Err(e) = handle.await {
            warn!(task = name, error = %e, "task ended abnormally");
        }
    }

    info!("sensorhub-server shutdown complete");
    Ok(())
}

/// Load configuration from `SENSORHUB_CONFIG` or the default path.
///
/// A missing default file falls back to built-in defaults (still subject
/// to environment overrides). A missing file named explicitly is an error.
fn load_config() -> Result<(SensorhubConfig, String), ServiceError> {
    if let Ok(path) = std::env::var("SENSORHUB_CONFIG") {
        let config = SensorhubConfig::from_file(&PathBuf::from(&path))?;
        return Ok((config, path));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = SensorhubConfig::from_file(&path)?;
        Ok((config, DEFAULT_CONFIG_PATH.to_owned()))
    } else {
        Ok((SensorhubConfig::parse("{}")?, String::from("defaults")))
    }
}
