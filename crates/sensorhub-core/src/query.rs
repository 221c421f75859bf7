//! Read-side query service over the [`SensorStore`].
//!
//! Everything here is a pure read: no query mutates the store, and
//! malformed arguments are rejected before the store is consulted.

use std::collections::BTreeMap;
use std::sync::Arc;

use sensorhub_types::{Domain, EntityId, HistoryRecord, Reading, Timestamp};

use crate::store::{SensorStore, TimeRange};

/// Errors surfaced to query callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The entity has never been recorded in this domain.
    #[error("no {domain} entity named {entity_id}")]
    NotFound {
        /// The queried domain.
        domain: Domain,
        /// The queried entity.
        entity_id: EntityId,
    },

    /// A caller-supplied argument could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl TimeRange {
    /// Parse optional `from` / `to` bounds given as epoch seconds.
    ///
    /// Empty strings count as absent. A `from` later than `to` is accepted
    /// and simply matches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] when a bound is not a finite
    /// number.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, QueryError> {
        Ok(Self::new(parse_bound("from", from)?, parse_bound("to", to)?))
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<Timestamp>, QueryError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(QueryError::InvalidArgument(format!(
            "`{name}` must be a finite number of epoch seconds, got {raw:?}"
        ))),
    }
}

/// Query facade handed to API surfaces.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<SensorStore>,
}

impl QueryService {
    /// Create a query service over a shared store.
    pub const fn new(store: Arc<SensorStore>) -> Self {
        Self { store }
    }

    /// Latest reading of every entity in `domain`. Empty if none recorded.
    pub async fn latest_all(&self, domain: Domain) -> BTreeMap<EntityId, Reading> {
        self.store.get_latest_all(domain).await
    }

    /// Latest reading of one entity.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotFound`] if the entity is unknown.
    pub async fn latest(&self, domain: Domain, entity_id: &EntityId) -> Result<Reading, QueryError> {
        self.store
            .get_latest(domain, entity_id)
            .await
            .ok_or_else(|| not_found(domain, entity_id))
    }

    /// History of one entity within `range`, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotFound`] if the entity has no history entry.
    /// A known entity with nothing in range yields an empty vector.
    pub async fn history(
        &self,
        domain: Domain,
        entity_id: &EntityId,
        range: &TimeRange,
    ) -> Result<Vec<HistoryRecord>, QueryError> {
        self.store
            .get_history(domain, entity_id, *range)
            .await
            .ok_or_else(|| not_found(domain, entity_id))
    }
}

fn not_found(domain: Domain, entity_id: &EntityId) -> QueryError {
    QueryError::NotFound {
        domain,
        entity_id: entity_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]

    use super::*;

    #[test]
    fn parse_accepts_numbers_and_absent_bounds() {
        assert_eq!(TimeRange::parse(None, None).unwrap(), TimeRange::unbounded());
        assert_eq!(
            TimeRange::parse(Some("1000"), Some(" 1010.5 ")).unwrap(),
            TimeRange::new(Some(1000.0), Some(1010.5))
        );
        assert_eq!(
            TimeRange::parse(Some(""), Some("5")).unwrap(),
            TimeRange::new(None, Some(5.0))
        );
    }

    #[test]
    fn parse_rejects_garbage_and_non_finite() {
        for bad in ["abc", "NaN", "inf", "-infinity", "12abc"] {
            let err = TimeRange::parse(Some(bad), None).unwrap_err();
            assert!(matches!(err, QueryError::InvalidArgument(_)), "{bad}");
        }
        assert!(TimeRange::parse(None, Some("x")).is_err());
    }

    #[test]
    fn inverted_range_is_valid_and_empty() {
        let range = TimeRange::parse(Some("20"), Some("10")).unwrap();
        assert!(!range.contains(15.0));
        assert!(!range.contains(20.0));
    }

    #[tokio::test]
    async fn unknown_entity_is_not_found() {
        let service = QueryService::new(Arc::new(SensorStore::new()));
        let nope = EntityId::from("nope");

        assert!(service.latest_all(Domain::Parking).await.is_empty());
        assert_eq!(
            service.latest(Domain::Parking, &nope).await.unwrap_err(),
            QueryError::NotFound {
                domain: Domain::Parking,
                entity_id: nope.clone()
            }
        );
        assert!(matches!(
            service
                .history(Domain::Parking, &nope, &TimeRange::unbounded())
                .await,
            Err(QueryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn empty_filtered_history_is_not_an_error() {
        let store = Arc::new(SensorStore::new());
        let reading = Reading::from_json(br#"{"available":1,"timestamp":50}"#, 0.0).unwrap();
        store.record(Domain::Parking, EntityId::from("P1"), reading).await;
        let service = QueryService::new(store);

        let records = service
            .history(
                Domain::Parking,
                &EntityId::from("P1"),
                &TimeRange::new(Some(100.0), None),
            )
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
