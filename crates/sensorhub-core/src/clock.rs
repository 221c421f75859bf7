//! Wall-clock abstraction.
//!
//! Ingestion needs "now" to stamp readings that arrive without a
//! timestamp, and the retention sweeper needs it to compute its cutoff.
//! Both take a [`Clock`] so tests can pin time with a [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sensorhub_types::Timestamp;

/// Source of the current time in epoch seconds.
pub trait Clock: Send + Sync + core::fmt::Debug {
    /// Current time, in seconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[allow(clippy::cast_precision_loss)]
    fn now(&self) -> Timestamp {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// A clock that only moves when told to.
///
/// The time is stored as the bit pattern of an `f64` so reads and writes
/// are lock-free.
#[derive(Debug)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub const fn new(now: Timestamp) -> Self {
        Self {
            bits: AtomicU64::new(now.to_bits()),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Timestamp) {
        self.bits.store(now.to_bits(), Ordering::SeqCst);
    }

    /// Move forward by `seconds`.
    pub fn advance(&self, seconds: f64) {
        let next = self.now() + seconds;
        self.set(next);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(1000.0);
        assert_eq!(clock.now(), 1000.0);
        clock.advance(5.5);
        assert_eq!(clock.now(), 1005.5);
        clock.set(42.0);
        assert_eq!(clock.now(), 42.0);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800.0);
    }
}
