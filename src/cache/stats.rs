//! Cache Statistics Module
//!
//! Read-only snapshot of the local cache's occupancy plus running counters.

use serde::Serialize;

// == Cache Stats ==
/// Occupancy and performance metrics for a local cache instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub entry_count: usize,
    /// Sum of the size estimates of all stored entries
    pub size_bytes: usize,
    /// Entry-count ceiling
    pub max_entries: usize,
    /// Memory budget
    pub max_size_bytes: usize,
    /// Number of successful reads
    pub hits: u64,
    /// Number of failed reads (absent or expired)
    pub misses: u64,
    /// Number of entries evicted by the count ceiling or memory budget
    pub evictions: u64,
    /// Number of entries removed because their TTL passed
    pub expirations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates empty stats for a cache with the given limits.
    pub fn new(max_entries: usize, max_size_bytes: usize) -> Self {
        Self {
            max_entries,
            max_size_bytes,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}
