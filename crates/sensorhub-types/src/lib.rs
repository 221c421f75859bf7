//! Shared type definitions for the Sensorhub ingestion service.
//!
//! This crate holds the sensor domain model used by every other crate in
//! the workspace. It performs no I/O. Types flow downstream to
//! `TypeScript` via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`enums`] -- The closed [`Domain`] enumeration and its per-domain data
//! - [`ids`] -- [`EntityId`], the per-domain entity key
//! - [`reading`] -- [`Reading`], a full decoded payload with a guaranteed timestamp
//! - [`history`] -- [`HistoryRecord`] samples and the pure projections producing them
//! - [`events`] -- [`LiveEvent`], the payload of the live stream

pub mod enums;
pub mod events;
pub mod history;
pub mod ids;
pub mod reading;

// Re-export all public types at crate root for convenience.
pub use enums::{Domain, Projector};
pub use events::LiveEvent;
pub use history::{
    BuildingSample, BusSample, HistoryRecord, LegacyRecord, ParkingSample, TaxiSample,
    WeatherSample, WifiSample,
};
pub use ids::EntityId;
pub use reading::{Reading, ReadingError, TIMESTAMP_FIELD, Timestamp};
