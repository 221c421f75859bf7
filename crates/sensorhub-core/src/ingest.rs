//! Ingestion pipeline: route, store, then fan out.
//!
//! [`Ingestor::handle`] is the single entry point for inbound events. It is
//! cheap to clone and safe to call from many tasks at once; each call runs
//! to completion on its own and failures never escape into the transport
//! loop that feeds it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sensorhub_types::HistoryRecord;
use serde::Serialize;
use tracing::{debug, warn};

use crate::fanout::FanOut;
use crate::router::{DecodeError, RoutedReading, TopicRouter};
use crate::store::SensorStore;

/// Running totals of ingest outcomes.
#[derive(Debug, Default)]
pub struct IngestStats {
    accepted: AtomicU64,
    dropped_malformed: AtomicU64,
    dropped_unknown_topic: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSnapshot {
    /// Events stored.
    pub accepted: u64,
    /// Events dropped because the payload could not be decoded.
    pub dropped_malformed: u64,
    /// Events dropped because the channel is not recognised.
    pub dropped_unknown_topic: u64,
}

impl IngestStats {
    /// Read all counters.
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped_malformed: self.dropped_malformed.load(Ordering::Relaxed),
            dropped_unknown_topic: self.dropped_unknown_topic.load(Ordering::Relaxed),
        }
    }

    fn count_drop(&self, error: &DecodeError) {
        let counter = match error {
            DecodeError::Malformed { .. } => &self.dropped_malformed,
            DecodeError::UnknownTopic { .. } => &self.dropped_unknown_topic,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Glue between the transport, the store and the live fan-out.
#[derive(Debug, Clone)]
pub struct Ingestor {
    router: TopicRouter,
    store: Arc<SensorStore>,
    fanout: FanOut,
    stats: Arc<IngestStats>,
}

impl Ingestor {
    /// Assemble an ingestor over shared components.
    pub fn new(router: TopicRouter, store: Arc<SensorStore>, fanout: FanOut) -> Self {
        Self {
            router,
            store,
            fanout,
            stats: Arc::new(IngestStats::default()),
        }
    }

    /// Shared handle to the outcome counters.
    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }

    /// Process one inbound `(channel, payload)` event.
    ///
    /// On success the reading is stored and then published to live
    /// subscribers, in that order, so a subscriber reacting to the event
    /// already sees it in the store. Returns the appended history record.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] for a dropped event. The drop has
    /// already been logged and counted; callers may ignore it.
    pub async fn handle(
        &self,
        channel: &str,
        payload: &[u8],
    ) -> Result<HistoryRecord, DecodeError> {
        let routed = match self.router.route(channel, payload) {
            Ok(routed) => routed,
            Err(error) => {
                warn!(%error, "dropping inbound event");
                self.stats.count_drop(&error);
                return Err(error);
            }
        };

        let RoutedReading {
            domain,
            entity_id,
            reading,
        } = routed;

        let record = self
            .store
            .record(domain, entity_id.clone(), reading.clone())
            .await;
        self.stats.accepted.fetch_add(1, Ordering::Relaxed);

        let delivered = self.fanout.publish(domain, entity_id, reading);
        debug!(%domain, channel, delivered, "ingested reading");

        Ok(record)
    }
}
