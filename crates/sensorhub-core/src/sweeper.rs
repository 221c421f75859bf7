//! Retention sweeper: periodic pruning of aged history.
//!
//! Each cycle computes `threshold = now - horizon` and prunes every entity
//! the store knows about. Entities are pruned one at a time, each under its
//! own lock acquisition, so ingestion and queries interleave with a long
//! sweep instead of waiting for all of it.

use std::sync::Arc;
use std::time::Duration;

use sensorhub_types::Timestamp;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::clock::Clock;
use crate::store::SensorStore;

/// Timing parameters for the sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweeps.
    pub period: Duration,
    /// Maximum age a history record may reach.
    pub horizon: Duration,
}

/// Outcome of one sweep cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepReport {
    /// Records older than this were removed.
    pub threshold: Timestamp,
    /// Entities pruned this cycle.
    pub entities_visited: usize,
    /// Total records removed this cycle.
    pub records_removed: usize,
}

/// Why a sweep cycle was skipped.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SweepError {
    /// The clock produced a time that cannot anchor a threshold.
    #[error("clock returned unusable time {now}")]
    ClockFault {
        /// The value the clock returned.
        now: Timestamp,
    },
}

/// Background task that enforces the retention horizon.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    store: Arc<SensorStore>,
    clock: Arc<dyn Clock>,
    config: SweepConfig,
}

impl RetentionSweeper {
    /// Create a sweeper over a shared store.
    pub fn new(store: Arc<SensorStore>, clock: Arc<dyn Clock>, config: SweepConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Run a single sweep cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::ClockFault`] when the computed threshold is
    /// not finite. Nothing is pruned in that case.
    pub async fn sweep_once(&self) -> Result<SweepReport, SweepError> {
        let now = self.clock.now();
        let threshold = now - self.config.horizon.as_secs_f64();
        if !threshold.is_finite() {
            return Err(SweepError::ClockFault { now });
        }

        let entities = self.store.entities().await;
        let mut records_removed = 0_usize;
        for (domain, entity_id) in &entities {
            records_removed = records_removed
                .saturating_add(self.store.prune(*domain, entity_id, threshold).await);
        }

        Ok(SweepReport {
            threshold,
            entities_visited: entities.len(),
            records_removed,
        })
    }

    /// Sweep every `period` until `token` is cancelled. The first sweep runs
    /// immediately.
    pub async fn run(self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            period_secs = self.config.period.as_secs(),
            horizon_secs = self.config.horizon.as_secs(),
            "retention sweeper started"
        );

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    info!("retention sweeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.sweep_once().await {
                        Ok(report) => info!(
                            threshold = report.threshold,
                            entities = report.entities_visited,
                            removed = report.records_removed,
                            "retention sweep complete"
                        ),
                        Err(e) => error!("retention sweep skipped: {e}"),
                    }
                }
            }
        }
    }
}
