//! In-memory latency histogram for upstream `generateKeywordIdeas` calls.

use std::sync::Mutex;
use std::time::Duration;

/// Shared latency stats. The Ads client records, the API reads.
/// Values stored in microseconds.
pub struct LatencyStats {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

impl LatencyStats {
    /// Tracks 1us to 100s, 3 significant figures.
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 100_000_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    pub fn record(&self, d: Duration) {
        let us = d.as_micros().clamp(1, 100_000_000) as u64;
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(us);
        }
    }

    /// Returns (p50_ms, p95_ms, p99_ms). None if no samples.
    pub fn percentiles_ms(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        let Ok(h) = self.inner.lock() else {
            return (None, None, None);
        };
        if h.len() == 0 {
            return (None, None, None);
        }
        let ms = |q: f64| h.value_at_quantile(q) as f64 / 1000.0;
        (Some(ms(0.5)), Some(ms(0.95)), Some(ms(0.99)))
    }

    pub fn len(&self) -> u64 {
        self.inner.lock().map(|h| h.len()).unwrap_or(0)
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_percentiles() {
        let stats = LatencyStats::new();
        assert_eq!(stats.len(), 0);
        assert_eq!(stats.percentiles_ms(), (None, None, None));
    }

    #[test]
    fn records_in_milliseconds() {
        let stats = LatencyStats::new();
        for _ in 0..10 {
            stats.record(Duration::from_millis(120));
        }
        assert_eq!(stats.len(), 10);
        let (p50, _, p99) = stats.percentiles_ms();
        assert!((p50.unwrap() - 120.0).abs() < 1.0);
        assert!((p99.unwrap() - 120.0).abs() < 1.0);
    }
}
