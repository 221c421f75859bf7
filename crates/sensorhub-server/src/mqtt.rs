//! MQTT subscriber that feeds the ingest pipeline.
//!
//! One session connects to the broker, subscribes to every configured
//! topic filter at `QoS` 0 and hands each `Publish` to
//! [`Ingestor::handle`]. When the session fails the subscriber waits
//! `reconnect_delay` and starts a fresh one; it only stops when the
//! cancellation token fires.

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use sensorhub_core::Ingestor;
use sensorhub_core::config::BrokerConfig;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::error::MqttError;

/// Requests buffered between the client handle and the event loop.
const CLIENT_CAPACITY: usize = 100;

/// Build a client id from `prefix` and eight hex characters of a v4 UUID.
pub fn client_id(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{prefix}{suffix}")
}

/// Run the subscriber until `token` is cancelled, reconnecting on error.
#[instrument(
    name = "mqtt_subscriber",
    skip_all,
    fields(host = %config.host, port = config.port)
)]
pub async fn run_mqtt_subscriber(config: BrokerConfig, ingestor: Ingestor, token: CancellationToken) {
    let client_id = client_id(&config.client_id_prefix);
    info!(%client_id, topics = ?config.topics, "starting MQTT subscriber");

    let mut attempt: u64 = 0;
    loop {
        if token.is_cancelled() {
            break;
        }

        match run_mqtt_connection(&config, &client_id, &ingestor, &token).await {
            Ok(()) => {
                debug!("MQTT subscriber stopped cleanly");
                break;
            }
            Err(e) => {
                attempt = attempt.saturating_add(1);
                error!(error = %e, attempt, "MQTT connection error");
                warn!(
                    delay_secs = config.reconnect_delay_secs,
                    "retrying MQTT connection"
                );
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(config.reconnect_delay()) => {}
                }
            }
        }
    }

    info!("MQTT subscriber stopped");
}

/// Run one broker session. Returns `Ok` only on cancellation.
async fn run_mqtt_connection(
    config: &BrokerConfig,
    client_id: &str,
    ingestor: &Ingestor,
    token: &CancellationToken,
) -> Result<(), MqttError> {
    let mut options = MqttOptions::new(client_id, config.host.as_str(), config.port);
    options.set_keep_alive(config.keep_alive());
    options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);

    for topic in &config.topics {
        client
            .subscribe(topic.as_str(), QoS::AtMostOnce)
            .await
            .map_err(|source| MqttError::Subscribe {
                topic: topic.clone(),
                source,
            })?;
    }

    loop {
        tokio::select! {
            () = token.cancelled() => {
                debug!("shutdown signal received");
                let _ = client.disconnect().await;
                return Ok(());
            }
            event = eventloop.poll() => {
                match event? {
                    Event::Incoming(Packet::Publish(publish)) => {
                        handle_mqtt_message(ingestor, &publish.topic, &publish.payload).await;
                    }
                    Event::Incoming(Packet::ConnAck(_)) => {
                        info!(host = %config.host, port = config.port, "connected to MQTT broker");
                    }
                    Event::Incoming(Packet::SubAck(_)) => {
                        debug!("subscription acknowledged");
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Hand one message to the ingest pipeline under its own root span.
async fn handle_mqtt_message(ingestor: &Ingestor, topic: &str, payload: &[u8]) {
    let span = info_span!(
        parent: Span::none(),
        "mqtt_message",
        topic = %topic,
        payload_size = payload.len(),
    );

    // Drops are logged and counted inside the ingestor.
    let _ = ingestor.handle(topic, payload).instrument(span).await;
}
