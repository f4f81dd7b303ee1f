//! Response DTOs for the operator API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::tiered::InvalidationSummary;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Whether the local tier is in use
    pub local_enabled: bool,
    pub entry_count: usize,
    pub size_bytes: usize,
    pub max_entries: usize,
    pub max_size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Builds the response from local-tier stats, all zeros when disabled
    pub fn from_stats(stats: Option<CacheStats>) -> Self {
        let local_enabled = stats.is_some();
        let stats = stats.unwrap_or_default();
        Self {
            local_enabled,
            entry_count: stats.entry_count,
            size_bytes: stats.size_bytes,
            max_entries: stats.max_entries,
            max_size_bytes: stats.max_size_bytes,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, always "healthy": a down shared tier degrades, it does not fail
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// "up" or "down"
    pub shared_tier: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(shared_tier_up: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            shared_tier: if shared_tier_up { "up" } else { "down" }.to_string(),
        }
    }
}

/// Response body for both invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub local_removed: usize,
    pub shared_removed: u64,
}

impl From<InvalidationSummary> for InvalidateResponse {
    fn from(summary: InvalidationSummary) -> Self {
        Self {
            local_removed: summary.local_removed,
            shared_removed: summary.shared_removed,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
