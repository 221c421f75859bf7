//! Live fan-out of accepted readings to subscribers.
//!
//! Wraps a [`broadcast`] channel. Publishing never blocks and never fails:
//! with no subscribers the event is simply dropped. A subscriber that falls
//! more than `capacity` events behind receives
//! [`broadcast::error::RecvError::Lagged`] and resumes from the newest
//! event.

use sensorhub_types::{Domain, EntityId, LiveEvent, Reading};
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast hub for [`LiveEvent`]s.
#[derive(Debug, Clone)]
pub struct FanOut {
    tx: broadcast::Sender<LiveEvent>,
}

impl FanOut {
    /// Create a hub whose subscribers may lag by up to `capacity` events.
    ///
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a reading as a live event. Returns how many subscribers
    /// were handed the event.
    pub fn publish(&self, domain: Domain, entity_id: EntityId, reading: Reading) -> usize {
        let event = LiveEvent::new(domain, entity_id, reading);
        // Err only means nobody is listening.
        let delivered = self.tx.send(event).unwrap_or(0);
        trace!(%domain, delivered, "published live event");
        delivered
    }

    /// Register a new subscriber. It sees events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
