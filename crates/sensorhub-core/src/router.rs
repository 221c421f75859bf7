//! Topic routing: channel name to domain and entity, payload to reading.
//!
//! Channels follow `iot/<domain-segment>/.../<entity-id>`. The router
//! matches the longest known prefix from [`TOPIC_ROUTES`], takes the final
//! path segment as the entity id, and decodes the payload into a
//! [`Reading`]. It never touches the store; callers decide what to do with
//! the routed reading.

use std::sync::Arc;

use sensorhub_types::{Domain, EntityId, Reading, ReadingError};
use tracing::trace;

use crate::clock::Clock;

/// Channel prefixes and the domain each one feeds.
///
/// Prefixes end with `/` so `iot/parkingX/...` does not match `iot/parking/`.
pub const TOPIC_ROUTES: [(&str, Domain); 6] = [
    ("iot/parking/", Domain::Parking),
    ("iot/batiments/", Domain::Building),
    ("iot/wifi/", Domain::Wifi),
    ("iot/meteo/", Domain::Weather),
    ("iot/transport/position/bus/", Domain::TransportBus),
    ("iot/transport/position/taxi/", Domain::TransportTaxi),
];

/// Why an inbound event was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload on a known channel could not be decoded.
    #[error("malformed payload on {channel}: {reason}")]
    Malformed {
        /// The channel the event arrived on.
        channel: String,
        /// What was wrong with the payload.
        reason: ReadingError,
    },

    /// The channel does not map to a domain and entity.
    #[error("unknown topic: {channel}")]
    UnknownTopic {
        /// The channel the event arrived on.
        channel: String,
    },
}

/// A decoded event, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedReading {
    /// Domain resolved from the channel prefix.
    pub domain: Domain,
    /// Final segment of the channel.
    pub entity_id: EntityId,
    /// The decoded payload.
    pub reading: Reading,
}

/// Maps raw `(channel, payload)` events to [`RoutedReading`]s.
#[derive(Debug, Clone)]
pub struct TopicRouter {
    clock: Arc<dyn Clock>,
}

impl TopicRouter {
    /// Create a router that stamps timestamp-less readings with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Decode one inbound event.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownTopic`] if the channel has no known
    /// prefix or no entity segment, and [`DecodeError::Malformed`] if the
    /// payload is not a JSON object with a usable timestamp.
    pub fn route(&self, channel: &str, payload: &[u8]) -> Result<RoutedReading, DecodeError> {
        let (domain, entity_id) = resolve_channel(channel)?;
        let reading =
            Reading::from_json(payload, self.clock.now()).map_err(|reason| {
                DecodeError::Malformed {
                    channel: channel.to_owned(),
                    reason,
                }
            })?;
        trace!(%domain, %entity_id, "routed reading");
        Ok(RoutedReading {
            domain,
            entity_id,
            reading,
        })
    }
}

/// Resolve a channel name to its domain and entity id.
///
/// # Errors
///
/// Returns [`DecodeError::UnknownTopic`] when no prefix matches or the
/// final segment is empty.
pub fn resolve_channel(channel: &str) -> Result<(Domain, EntityId), DecodeError> {
    let unknown = || DecodeError::UnknownTopic {
        channel: channel.to_owned(),
    };

    let (prefix, domain) = TOPIC_ROUTES
        .iter()
        .filter(|(prefix, _)| channel.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .ok_or_else(unknown)?;

    let rest = channel.get(prefix.len()..).unwrap_or_default();
    let entity = rest.rsplit('/').next().unwrap_or_default();
    if entity.is_empty() {
        return Err(unknown());
    }

    Ok((*domain, EntityId::from(entity)))
}
