//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /api/status` -- liveness and counters
/// - `GET /ws/events` -- `WebSocket` live event stream
/// - `GET /api/{domain}` / `{domain}/{id}` / `{domain}/{id}/history`
/// - `GET /api/transport/{kind}` / `{kind}/{id}` / `{kind}/{id}/history`
///
/// Every `/history` route has a `/historique` twin that serves the same
/// samples under the producers' field names.
///
/// CORS allows any origin so browser dashboards on other hosts can poll.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/status", get(handlers::status))
        // WebSocket
        .route("/ws/events", get(ws::ws_events))
        // Transport (two-segment domains)
        .route("/api/transport/{kind}", get(handlers::list_transport_latest))
        .route("/api/transport/{kind}/{id}", get(handlers::get_transport_latest))
        .route(
            "/api/transport/{kind}/{id}/history",
            get(handlers::get_transport_history),
        )
        .route(
            "/api/transport/{kind}/{id}/historique",
            get(handlers::get_transport_history_legacy),
        )
        // Single-segment domains
        .route("/api/{domain}", get(handlers::list_latest))
        .route("/api/{domain}/{id}", get(handlers::get_latest))
        .route("/api/{domain}/{id}/history", get(handlers::get_history))
        .route(
            "/api/{domain}/{id}/historique",
            get(handlers::get_history_legacy),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
