//! REST API endpoint handlers for the Observer server.
//!
//! All reads go through the core query service held in [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/status` | Liveness, ingest counters, store sizes |
//! | `GET` | `/api/{domain}` | Latest reading of every entity |
//! | `GET` | `/api/{domain}/{id}` | Latest reading of one entity |
//! | `GET` | `/api/{domain}/{id}/history` | Entity history, `from`/`to` filtered |
//! | `GET` | `/api/{domain}/{id}/historique` | Same history under the producers' keys |
//!
//! `{domain}` is one of `parking`, `batiments`, `wifi`, `meteo`; the
//! transport domains live under `/api/transport/{bus|taxi}` with the same
//! three shapes.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use sensorhub_core::{DomainCounts, IngestSnapshot, TimeRange};
use sensorhub_types::{Domain, EntityId, HistoryRecord, LegacyRecord, Reading, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter and response structs
// ---------------------------------------------------------------------------

/// Query parameters for the history endpoints.
///
/// Bounds are epoch seconds. `debut` and `fin` are accepted in place of
/// `from` and `to`; the English names win when both are given.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Lower bound, inclusive.
    pub from: Option<String>,
    /// Upper bound, inclusive.
    pub to: Option<String>,
    /// Alias of `from`.
    pub debut: Option<String>,
    /// Alias of `to`.
    pub fin: Option<String>,
}

impl HistoryQuery {
    fn range(&self) -> Result<TimeRange, ObserverError> {
        let from = self.from.as_deref().or(self.debut.as_deref());
        let to = self.to.as_deref().or(self.fin.as_deref());
        Ok(TimeRange::parse(from, to)?)
    }
}

/// Body of `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always `online` while the server answers.
    pub status: &'static str,
    /// Server time, epoch seconds.
    pub timestamp: Timestamp,
    /// Ingest counters.
    pub stats: IngestSnapshot,
    /// Entity and record totals per domain.
    pub store: BTreeMap<Domain, DomainCounts>,
}

fn resolve_domain(segment: &str) -> Result<Domain, ObserverError> {
    Domain::from_api_segment(segment).ok_or_else(|| ObserverError::UnknownDomain(segment.to_owned()))
}

fn resolve_transport(kind: &str) -> Result<Domain, ObserverError> {
    resolve_domain(&format!("transport/{kind}"))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Report liveness plus ingest and store counters.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online",
        timestamp: state.now(),
        stats: state.ingest_snapshot(),
        store: state.store_counts().await,
    })
}

// ---------------------------------------------------------------------------
// Shared per-domain reads
// ---------------------------------------------------------------------------

async fn latest_all(state: &AppState, domain: Domain) -> Json<BTreeMap<EntityId, Reading>> {
    Json(state.queries.latest_all(domain).await)
}

async fn latest_one(
    state: &AppState,
    domain: Domain,
    id: String,
) -> Result<Json<Reading>, ObserverError> {
    let reading = state.queries.latest(domain, &EntityId::new(id)).await?;
    Ok(Json(reading))
}

async fn history(
    state: &AppState,
    domain: Domain,
    id: String,
    query: &HistoryQuery,
) -> Result<Json<Vec<HistoryRecord>>, ObserverError> {
    // Arguments are validated before the store is consulted.
    let range = query.range()?;
    let records = state
        .queries
        .history(domain, &EntityId::new(id), &range)
        .await?;
    Ok(Json(records))
}

async fn legacy_history(
    state: &AppState,
    domain: Domain,
    id: String,
    query: &HistoryQuery,
) -> Result<Json<Vec<LegacyRecord>>, ObserverError> {
    let Json(records) = history(state, domain, id, query).await?;
    Ok(Json(records.into_iter().map(LegacyRecord).collect()))
}

// ---------------------------------------------------------------------------
// GET /api/{domain}[/{id}[/history]]
// ---------------------------------------------------------------------------

/// Latest reading of every entity in a domain.
///
/// # Errors
///
/// Returns [`ObserverError::UnknownDomain`] for an unrecognised segment.
pub async fn list_latest(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
) -> Result<Json<BTreeMap<EntityId, Reading>>, ObserverError> {
    let domain = resolve_domain(&domain)?;
    Ok(latest_all(&state, domain).await)
}

/// Latest reading of one entity.
///
/// # Errors
///
/// 404 for an unknown domain or entity.
pub async fn get_latest(
    State(state): State<Arc<AppState>>,
    Path((domain, id)): Path<(String, String)>,
) -> Result<Json<Reading>, ObserverError> {
    latest_one(&state, resolve_domain(&domain)?, id).await
}

/// Time-filtered history of one entity.
///
/// # Errors
///
/// 400 for malformed bounds, 404 for an unknown domain or an entity with
/// no history.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path((domain, id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRecord>>, ObserverError> {
    history(&state, resolve_domain(&domain)?, id, &query).await
}

/// [`get_history`] keyed as the producers publish (`places_disponibles`,
/// `occupation_totale`, ...).
///
/// # Errors
///
/// Same as [`get_history`].
pub async fn get_history_legacy(
    State(state): State<Arc<AppState>>,
    Path((domain, id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LegacyRecord>>, ObserverError> {
    legacy_history(&state, resolve_domain(&domain)?, id, &query).await
}

// ---------------------------------------------------------------------------
// GET /api/transport/{kind}[/{id}[/history]]
// ---------------------------------------------------------------------------

/// Latest reading of every vehicle of one kind.
///
/// # Errors
///
/// Returns [`ObserverError::UnknownDomain`] for a kind other than `bus`
/// or `taxi`.
pub async fn list_transport_latest(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<BTreeMap<EntityId, Reading>>, ObserverError> {
    let domain = resolve_transport(&kind)?;
    Ok(latest_all(&state, domain).await)
}

/// Latest reading of one vehicle.
///
/// # Errors
///
/// 404 for an unknown kind or vehicle.
pub async fn get_transport_latest(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Reading>, ObserverError> {
    latest_one(&state, resolve_transport(&kind)?, id).await
}

/// Time-filtered history of one vehicle.
///
/// # Errors
///
/// 400 for malformed bounds, 404 for an unknown kind or a vehicle with
/// no history.
pub async fn get_transport_history(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRecord>>, ObserverError> {
    history(&state, resolve_transport(&kind)?, id, &query).await
}

/// [`get_transport_history`] keyed as the producers publish.
///
/// # Errors
///
/// Same as [`get_transport_history`].
pub async fn get_transport_history_legacy(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LegacyRecord>>, ObserverError> {
    legacy_history(&state, resolve_transport(&kind)?, id, &query).await
}
