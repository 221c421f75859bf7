//! `WebSocket` handler for real-time sensor event streaming.
//!
//! Clients connect to `GET /ws/events` and receive a JSON-encoded
//! [`LiveEvent`] text frame for every reading the service stores. The
//! `event` field carries the per-domain name (`update_parking`,
//! `update_wifi`, ...) so clients can dispatch on it.
//!
//! The fan-out subscription is taken before the upgrade response is sent,
//! so a client sees every reading stored after its handshake completes.
//! A client that falls behind skips the lagged events and resumes from
//! the most recent one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use sensorhub_types::LiveEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::state::AppState;

/// What the connection loop does after one event or client frame.
enum Step {
    Send(Message),
    Idle,
    Close,
}

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming live events.
///
/// # Route
///
/// `GET /ws/events`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.subscribe();
    ws.on_upgrade(move |socket| stream_events(socket, rx))
}

async fn stream_events(mut socket: WebSocket, mut rx: broadcast::Receiver<LiveEvent>) {
    debug!("WebSocket client connected");

    loop {
        let step = tokio::select! {
            result = rx.recv() => on_event(&result),
            msg = socket.recv() => on_client_frame(msg),
        };
        match step {
            Step::Send(frame) => {
                if socket.send(frame).await.is_err() {
                    debug!("WebSocket client disconnected (send failed)");
                    return;
                }
            }
            Step::Idle => {}
            Step::Close => return,
        }
    }
}

fn on_event(result: &Result<LiveEvent, RecvError>) -> Step {
    match result {
        Ok(event) => live_frame(event).map_or(Step::Idle, Step::Send),
        Err(RecvError::Lagged(skipped)) => {
            debug!(skipped = *skipped, "WebSocket client lagged, skipping ahead");
            Step::Idle
        }
        Err(RecvError::Closed) => {
            debug!("Fan-out closed, shutting down WebSocket");
            Step::Close
        }
    }
}

fn on_client_frame(msg: Option<Result<Message, axum::Error>>) -> Step {
    match msg {
        Some(Ok(Message::Close(_))) | None => {
            debug!("WebSocket client disconnected");
            Step::Close
        }
        Some(Ok(Message::Ping(data))) => Step::Send(Message::Pong(data)),
        Some(Err(e)) => {
            debug!("WebSocket error: {e}");
            Step::Close
        }
        // The stream is one-way; client text and binary frames are ignored.
        Some(Ok(_)) => Step::Idle,
    }
}

/// Encode one live event as a text frame.
fn live_frame(event: &LiveEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!(entity_id = %event.entity_id, "Failed to serialize live event: {e}");
            None
        }
    }
}
