//! Shared health state for the /health endpoint.
//! Updated by the keyword handlers, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct HealthState {
    started_at: Instant,
    /// Keyword and credential-test requests handled since start.
    requests_served: AtomicU64,
    /// Requests that ended in an upstream or OAuth failure.
    upstream_failures: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_served: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_requests_served(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_upstream_failures(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn upstream_failures(&self) -> u64 {
        self.upstream_failures.load(Ordering::Relaxed)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
