//! Per-path dispatch spacing.
//!
//! Each exact path string owns one "next allowed start" instant. A caller
//! reserves its slot under the lock, then sleeps outside it, so a busy path
//! never delays an unrelated one and concurrent callers on one path are
//! spread over successive slots instead of racing for the same one.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Spaces dispatch starts on the same path at least `interval` apart.
pub struct PathRateLimiter {
    interval: Duration,
    last_start: Mutex<HashMap<String, Instant>>,
}

impl PathRateLimiter {
    /// Create a limiter with the given minimum spacing.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: Mutex::new(HashMap::new()),
        }
    }

    /// Configured minimum spacing.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reserve the next start slot for `path` and record it.
    ///
    /// Returns the instant at which the caller may start.
    pub fn reserve(&self, path: &str) -> Instant {
        let now = Instant::now();
        let mut slots = self.last_start.lock();
        let start = match slots.get(path) {
            Some(&last) => (last + self.interval).max(now),
            None => now,
        };
        let _ = slots.insert(path.to_string(), start);
        start
    }

    /// Reserve a slot for `path` and wait until it opens.
    ///
    /// Returns how long the caller waited.
    pub async fn acquire(&self, path: &str) -> Duration {
        let start = self.reserve(path);
        let now = Instant::now();
        if start > now {
            tokio::time::sleep_until(start).await;
        }
        start.saturating_duration_since(now)
    }

    /// Record that a call on `path` finished.
    ///
    /// The stored instant only moves forward, so a slow call pushes the next
    /// slot out and a later reservation is never pulled back.
    pub fn complete(&self, path: &str) {
        let now = Instant::now();
        let mut slots = self.last_start.lock();
        let entry = slots.entry(path.to_string()).or_insert(now);
        if now > *entry {
            *entry = now;
        }
    }

    /// Forget all recorded paths.
    pub fn reset(&self) {
        self.last_start.lock().clear();
    }

    /// Number of paths currently tracked.
    pub fn tracked_paths(&self) -> usize {
        self.last_start.lock().len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
