// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so elapsed time and timestamps are testable.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of wall-clock and monotonic time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, for measuring elapsed durations.
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch, for timestamps.
    fn epoch_ms(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for tests.
#[derive(Clone)]
pub struct FakeClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
    epoch_base_ms: u64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::at_epoch_ms(1_700_000_000_000)
    }

    /// Start the fake clock at a specific epoch-ms value.
    pub fn at_epoch_ms(epoch_base_ms: u64) -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
            epoch_base_ms,
        }
    }

    /// Advance the clock by `d`. Affects all clones.
    pub fn advance(&self, d: Duration) {
        *self.offset.lock() += d;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_base_ms + self.offset.lock().as_millis() as u64
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
