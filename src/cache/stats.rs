//! Cache Statistics
//!
//! Aggregate load/hit/miss counters for external observability tooling.
//! Purely observational; nothing in the cache changes behavior based on
//! these numbers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

/// Counters updated by the cache as it serves requests
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Load attempts (successful or not)
    loads: AtomicU64,
    /// Lookups that found an entry
    hits: AtomicU64,
    /// Lookups that found nothing
    misses: AtomicU64,
    /// Load attempts that failed
    load_errors: AtomicU64,
}

/// Point-in-time view of the counters with derived rates
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub loads: u64,
    pub hits: u64,
    pub misses: u64,
    pub load_errors: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub load_error_rate: f64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_error(&self) {
        self.load_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters and compute rates.
    ///
    /// Hit rate is over all lookups and reports 1.0 for an idle cache (no
    /// lookups means no misses); load-error rate is over load attempts.
    pub fn snapshot(&self) -> StatsSnapshot {
        let loads = self.loads.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let load_errors = self.load_errors.load(Ordering::Relaxed);

        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            1.0
        } else {
            hits as f64 / lookups as f64
        };
        let load_error_rate = if loads == 0 {
            0.0
        } else {
            load_errors as f64 / loads as f64
        };

        StatsSnapshot {
            loads,
            hits,
            misses,
            load_errors,
            hit_rate,
            miss_rate: 1.0 - hit_rate,
            load_error_rate,
        }
    }

    /// Log current counters at debug level
    pub fn log(&self) {
        let s = self.snapshot();
        debug!(
            loads = s.loads,
            hits = s.hits,
            misses = s.misses,
            load_errors = s.load_errors,
            hit_rate = format!("{:.1}%", s.hit_rate * 100.0),
            "Cache metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_cache_reports_clean_rates() {
        let stats = CacheStats::default();
        let s = stats.snapshot();
        assert_eq!(s.hit_rate, 1.0);
        assert_eq!(s.miss_rate, 0.0);
        assert_eq!(s.load_error_rate, 0.0);
    }

    #[test]
    fn rates_follow_counters() {
        let stats = CacheStats::default();
        stats.record_miss();
        stats.record_load();
        stats.record_hit();
        stats.record_hit();
        stats.record_load();
        stats.record_load_error();

        let s = stats.snapshot();
        assert_eq!(s.hits, 2);
        assert_eq!(s.misses, 1);
        assert_eq!(s.loads, 2);
        assert_eq!(s.load_errors, 1);
        assert!((s.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((s.miss_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((s.load_error_rate - 0.5).abs() < 1e-9);
    }
}
