//! Shared application state for the Observer API server.
//!
//! [`AppState`] bundles the read-side handles the handlers need: the
//! query service, the live fan-out, the ingest counters and the clock
//! used to stamp status responses. Everything in it is a cheap shared
//! handle; the store itself lives in the core crate.

use std::collections::BTreeMap;
use std::sync::Arc;

use sensorhub_core::{
    Clock, DomainCounts, FanOut, IngestSnapshot, IngestStats, QueryService, SensorStore,
};
use sensorhub_types::{Domain, LiveEvent, Timestamp};
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-side queries over the store.
    pub queries: QueryService,
    store: Arc<SensorStore>,
    /// Live event hub that `WebSocket` clients subscribe to.
    pub fanout: FanOut,
    /// Ingest outcome counters.
    pub stats: Arc<IngestStats>,
    /// Clock used for status timestamps.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create application state over the shared core components.
    pub fn new(
        store: Arc<SensorStore>,
        fanout: FanOut,
        stats: Arc<IngestStats>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queries: QueryService::new(Arc::clone(&store)),
            store,
            fanout,
            stats,
            clock,
        }
    }

    /// Subscribe to the live event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.fanout.subscribe()
    }

    /// Current time according to the service clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Ingest counters as of now.
    pub fn ingest_snapshot(&self) -> IngestSnapshot {
        self.stats.snapshot()
    }

    /// Entity and record totals per domain.
    pub async fn store_counts(&self) -> BTreeMap<Domain, DomainCounts> {
        self.store.counts().await
    }
}
