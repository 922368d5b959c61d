//! Liveness of the Active instance
//!
//! The monitor is a pure predicate over two heartbeat observations. Callers
//! keep the "last seen" observation themselves and replace it whenever the
//! value moves; [`Cadence`] paces the Active side's increments.

use crate::shm::SharedStateStore;

/// A heartbeat value and the local time (ms) it was observed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat {
    pub value: u64,
    pub at_ms: u64,
}

impl Beat {
    pub fn new(value: u64, at_ms: u64) -> Self {
        Self { value, at_ms }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatMonitor {
    timeout_ms: u64,
}

impl HeartbeatMonitor {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Current heartbeat value in the region
    pub fn sample(store: &SharedStateStore) -> u64 {
        store.heartbeat()
    }

    /// True once `now` shows no progress since `last_seen` for at least the
    /// timeout window
    pub fn is_stale(&self, last_seen: Beat, now: Beat) -> bool {
        now.value == last_seen.value && now.at_ms.saturating_sub(last_seen.at_ms) >= self.timeout_ms
    }
}

/// Fixed-interval pacer driven by caller-supplied time
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    last_ms: u64,
}

impl Cadence {
    pub fn starting_at(now_ms: u64) -> Self {
        Self { last_ms: now_ms }
    }

    /// True (and rearms) when `interval_ms` has passed since the last firing
    pub fn due(&mut self, now_ms: u64, interval_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) >= interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self, now_ms: u64) {
        self.last_ms = now_ms;
    }
}
