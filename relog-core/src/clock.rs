//! Clock implementations.
//!
//! Stores never read the wall clock directly; they ask an injected
//! [`Clock`](crate::traits::Clock). Production code uses [`SystemClock`],
//! tests drive time with [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::traits::Clock;
use crate::types::Timestamp;

/// Wall clock with microsecond resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// Manually driven clock for deterministic tests.
///
/// The current time is stored as raw `f64` bits so it can be shared
/// across threads without a lock.
#[derive(Debug)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            bits: AtomicU64::new(now.to_bits()),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        self.bits.store(now.to_bits(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `secs` and returns the new time.
    pub fn advance(&self, secs: f64) -> Timestamp {
        let mut current = self.bits.load(Ordering::SeqCst);
        loop {
            let next = f64::from_bits(current) + secs;
            match self.bits.compare_exchange(
                current,
                next.to_bits(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
