//! Observer API server for Sensorhub.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for the latest reading of every sensor, one
//!   sensor's latest reading, and its time-filtered history, per domain
//! - **Status endpoint** (`/api/status`) with ingest counters and store
//!   sizes
//! - **`WebSocket` endpoint** (`/ws/events`) streaming every stored
//!   reading as it arrives, fed by the core [`FanOut`]
//!
//! # Architecture
//!
//! Handlers never touch the store directly; reads go through the core
//! [`QueryService`] held in [`AppState`]. `WebSocket` clients subscribe
//! to the broadcast channel with automatic lag handling, so a slow
//! browser never holds up ingestion.
//!
//! [`FanOut`]: sensorhub_core::FanOut
//! [`QueryService`]: sensorhub_core::QueryService

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use state::AppState;
