//! Live event payloads pushed to observers.

use serde::Serialize;
use ts_rs::TS;

use crate::enums::Domain;
use crate::ids::EntityId;
use crate::reading::Reading;

/// One stored reading, as delivered on the live stream.
///
/// Carries the full reading rather than its history projection so that
/// live views can render everything the sensor sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LiveEvent {
    /// Event name for this domain (e.g. `update_parking`).
    pub event: String,
    /// The reading's domain.
    pub domain: Domain,
    /// The entity that produced the reading.
    pub entity_id: EntityId,
    /// The reading as stored.
    pub reading: Reading,
}

impl LiveEvent {
    /// Build the live event for a stored reading.
    pub fn new(domain: Domain, entity_id: EntityId, reading: Reading) -> Self {
        Self {
            event: domain.live_event_name().to_owned(),
            domain,
            entity_id,
            reading,
        }
    }
}
