//! Cache Entry Module
//!
//! Defines the structure for individual local cache entries and the
//! approximate size estimation used for memory-budget accounting.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

// == Size Estimation Constants ==
/// Bytes charged per character of the serialized value
pub const BYTES_PER_CHAR: usize = 2;

/// Fixed bookkeeping overhead charged per entry
pub const ENTRY_OVERHEAD_BYTES: usize = 64;

// == Cache Entry ==
/// Represents a single local cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Last successful read (Unix milliseconds), set to the creation time on insert
    pub last_accessed_at: u64,
    /// Approximate size computed once at insertion
    pub size_bytes: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry that expires `ttl` from now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Time to live
    /// * `size_bytes` - Pre-computed size estimate for the value
    pub fn new(value: V, ttl: Duration, size_bytes: usize) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            value,
            expires_at: now.saturating_add(ttl_ms),
            last_accessed_at: now,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`CacheEntry::is_expired`] against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self) {
        self.last_accessed_at = current_timestamp_ms();
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Estimates the in-memory footprint of a value.
///
/// Serializes the value to JSON and charges `chars * BYTES_PER_CHAR` plus a
/// fixed per-entry overhead. Values that fail to serialize are charged the
/// overhead only.
pub fn estimate_size<V: Serialize>(value: &V) -> usize {
    let chars = serde_json::to_string(value)
        .map(|json| json.chars().count())
        .unwrap_or(0);
    chars * BYTES_PER_CHAR + ENTRY_OVERHEAD_BYTES
}
