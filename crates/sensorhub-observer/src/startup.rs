//! Observer server startup helper for embedding in the service binary.
//!
//! Provides [`spawn_observer`] which launches the Observer HTTP +
//! `WebSocket` server on a background Tokio task. Binding happens before
//! the task is spawned, so a taken port fails startup instead of
//! surfacing later as a log line.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running Observer server.
#[derive(Debug)]
pub struct RunningObserver {
    /// The address actually bound (resolves port `0`).
    pub local_addr: SocketAddr,
    /// The serving task. Completes after the shutdown token fires.
    pub handle: JoinHandle<()>,
}

/// Bind and spawn the Observer server on a background Tokio task.
///
/// The server drains and exits once `token` is cancelled; await the
/// returned handle to wait for that.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
    token: CancellationToken,
) -> Result<RunningObserver, StartupError> {
    let listener = server::bind(config).await?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state, token).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%local_addr, "Observer server spawned on background task");

    Ok(RunningObserver { local_addr, handle })
}
