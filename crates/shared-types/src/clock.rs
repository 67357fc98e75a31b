//! # Clock Port
//!
//! Timelocks, fee accrual and policy windows are evaluated against "now" at
//! call time. The engine never reads the system time directly.

use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current unix timestamp in seconds.
pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<u64>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: u64) {
        let mut now = self.now.lock();
        *now = now.saturating_add(seconds);
    }

    /// Jumps to an absolute timestamp.
    pub fn set(&self, timestamp: u64) {
        *self.now.lock() = timestamp;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        *self.now.lock()
    }
}
