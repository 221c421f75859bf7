//! Ingestion, state store, retention and queries for Sensorhub.
//!
//! Data flows one way: inbound `(channel, payload)` events pass through the
//! [`TopicRouter`](router::TopicRouter), land in the
//! [`SensorStore`](store::SensorStore), and are echoed to live subscribers
//! through the [`FanOut`](fanout::FanOut). The
//! [`RetentionSweeper`](sweeper::RetentionSweeper) trims history in the
//! background while the [`QueryService`](query::QueryService) serves reads.
//!
//! # Modules
//!
//! - [`clock`] -- [`Clock`](clock::Clock) trait with system and manual clocks.
//! - [`config`] -- Configuration loading from `sensorhub-config.yaml`.
//! - [`fanout`] -- Broadcast hub for live events.
//! - [`ingest`] -- The route, store, publish pipeline and its counters.
//! - [`query`] -- Read-side queries and argument parsing.
//! - [`router`] -- Channel to domain/entity resolution and payload decoding.
//! - [`store`] -- The latest and history tables behind one lock.
//! - [`sweeper`] -- Periodic retention pruning.

pub mod clock;
pub mod config;
pub mod fanout;
pub mod ingest;
pub mod query;
pub mod router;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fanout::FanOut;
pub use ingest::{IngestSnapshot, IngestStats, Ingestor};
pub use query::{QueryError, QueryService};
pub use router::{DecodeError, TopicRouter};
pub use store::{DomainCounts, SensorStore, TimeRange};
pub use sweeper::{RetentionSweeper, SweepConfig, SweepError, SweepReport};
