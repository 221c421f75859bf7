//! In-memory state store: latest reading and history per entity.
//!
//! [`SensorStore`] owns two tables behind a single reader-writer lock:
//!
//! - **latest** -- `Domain x EntityId -> Reading`, overwritten on every
//!   ingest (arrival order wins, not timestamp order)
//! - **history** -- `Domain x EntityId -> [HistoryRecord]`, appended on
//!   every ingest in arrival order and shrunk only by [`SensorStore::prune`]
//!
//! Every write (`record`, `prune`) holds the write half for its whole
//! duration, so a reader never sees a latest entry without its history
//! append or the other way around. History keys are never removed; an
//! entity whose records were all pruned keeps an empty sequence.

use std::collections::{BTreeMap, VecDeque};

use sensorhub_types::{Domain, EntityId, HistoryRecord, Reading, Timestamp};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Inclusive time bounds for history reads. `None` leaves a side open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeRange {
    /// Lower bound (`from <= timestamp`).
    pub from: Option<Timestamp>,
    /// Upper bound (`timestamp <= to`).
    pub to: Option<Timestamp>,
}

impl TimeRange {
    /// A range with both sides open.
    pub const fn unbounded() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    /// Build a range from optional bounds.
    pub const fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        Self { from, to }
    }

    /// Whether `timestamp` lies within the bounds.
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.from.is_none_or(|from| from <= timestamp) && self.to.is_none_or(|to| timestamp <= to)
    }
}

/// Per-domain sizes, for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DomainCounts {
    /// Entities with a latest reading.
    pub entities: usize,
    /// History records currently retained.
    pub records: usize,
}

#[derive(Debug, Default)]
struct Tables {
    latest: BTreeMap<Domain, BTreeMap<EntityId, Reading>>,
    history: BTreeMap<Domain, BTreeMap<EntityId, VecDeque<HistoryRecord>>>,
}

/// Shared, concurrency-safe store of sensor state.
///
/// Pass it around as `Arc<SensorStore>`.
#[derive(Debug, Default)]
pub struct SensorStore {
    tables: RwLock<Tables>,
}

impl SensorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reading: overwrite the entity's latest entry and append its
    /// projection to the entity's history, as one atomic step.
    ///
    /// The projection is computed before the lock is taken. Returns the
    /// appended history record.
    pub async fn record(
        &self,
        domain: Domain,
        entity_id: EntityId,
        reading: Reading,
    ) -> HistoryRecord {
        let projected = domain.project(&reading);

        let mut tables = self.tables.write().await;
        tables
            .latest
            .entry(domain)
            .or_default()
            .insert(entity_id.clone(), reading);
        tables
            .history
            .entry(domain)
            .or_default()
            .entry(entity_id)
            .or_default()
            .push_back(projected.clone());

        projected
    }

    /// The most recently ingested reading for an entity.
    pub async fn get_latest(&self, domain: Domain, entity_id: &EntityId) -> Option<Reading> {
        let tables = self.tables.read().await;
        tables
            .latest
            .get(&domain)
            .and_then(|entities| entities.get(entity_id))
            .cloned()
    }

    /// A point-in-time copy of every entity's latest reading in a domain.
    pub async fn get_latest_all(&self, domain: Domain) -> BTreeMap<EntityId, Reading> {
        let tables = self.tables.read().await;
        tables.latest.get(&domain).cloned().unwrap_or_default()
    }

    /// An entity's history filtered to `range`, in arrival order.
    ///
    /// Returns `None` when the entity has no history entry at all, and
    /// `Some(vec![])` when it has one but nothing falls in the range.
    pub async fn get_history(
        &self,
        domain: Domain,
        entity_id: &EntityId,
        range: TimeRange,
    ) -> Option<Vec<HistoryRecord>> {
        let tables = self.tables.read().await;
        let sequence = tables.history.get(&domain)?.get(entity_id)?;
        Some(
            sequence
                .iter()
                .filter(|record| range.contains(record.timestamp()))
                .cloned()
                .collect(),
        )
    }

    /// Whether the entity has a history entry (possibly empty).
    pub async fn has_history(&self, domain: Domain, entity_id: &EntityId) -> bool {
        let tables = self.tables.read().await;
        tables
            .history
            .get(&domain)
            .is_some_and(|entities| entities.contains_key(entity_id))
    }

    /// Remove every history record with `timestamp < threshold`.
    ///
    /// Idempotent, and a no-op for entities without history. Returns the
    /// number of records removed.
    pub async fn prune(&self, domain: Domain, entity_id: &EntityId, threshold: Timestamp) -> usize {
        let mut tables = self.tables.write().await;
        let Some(sequence) = tables
            .history
            .get_mut(&domain)
            .and_then(|entities| entities.get_mut(entity_id))
        else {
            return 0;
        };
        let removed = prune_sequence(sequence, threshold);
        if removed > 0 {
            debug!(%domain, %entity_id, removed, threshold, "pruned history");
        }
        removed
    }

    /// Every `(domain, entity)` pair that has a history entry.
    pub async fn entities(&self) -> Vec<(Domain, EntityId)> {
        let tables = self.tables.read().await;
        tables
            .history
            .iter()
            .flat_map(|(domain, entities)| entities.keys().map(|id| (*domain, id.clone())))
            .collect()
    }

    /// Entity and record totals for every domain, including empty ones.
    pub async fn counts(&self) -> BTreeMap<Domain, DomainCounts> {
        let tables = self.tables.read().await;
        Domain::ALL
            .into_iter()
            .map(|domain| {
                let entities = tables.latest.get(&domain).map_or(0, BTreeMap::len);
                let records = tables
                    .history
                    .get(&domain)
                    .map_or(0, |seqs| seqs.values().map(VecDeque::len).sum());
                (domain, DomainCounts { entities, records })
            })
            .collect()
    }
}

/// Drop stale records from one history sequence.
///
/// Records usually arrive in timestamp order, so the stale ones sit at the
/// front and are popped without touching the rest. Late arrivals can leave
/// a stale record behind a fresh one; a full pass catches those.
fn prune_sequence(sequence: &mut VecDeque<HistoryRecord>, threshold: Timestamp) -> usize {
    let before = sequence.len();
    let is_stale = |record: &HistoryRecord| record.timestamp() < threshold;

    while sequence.front().is_some_and(is_stale) {
        sequence.pop_front();
    }
    if sequence.iter().any(is_stale) {
        sequence.retain(|record| !is_stale(record));
    }

    before.saturating_sub(sequence.len())
}
