//! Cache hit/miss counters.
//!
//! Recorded through the `metrics` facade. Without an installed recorder these
//! calls are no-ops, so the embedding application decides where they go.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "plantauth_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "plantauth_cache_misses_total";
}

/// Record a cache hit on the given tier ("L1" or "L2").
pub fn record_cache_hit(tier: &'static str) {
    counter!(names::CACHE_HITS_TOTAL, "tier" => tier).increment(1);
}

/// Record a cache miss.
pub fn record_cache_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}
