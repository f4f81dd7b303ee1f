//! Local Cache Store Module
//!
//! Bounded in-process cache combining HashMap storage with LRU tracking,
//! TTL expiration, and approximate memory-budget accounting.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::entry::{current_timestamp_ms, estimate_size};
use crate::cache::{glob_match, CacheEntry, CacheStats, LruTracker};

// == Defaults ==
/// Default entry-count ceiling
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default memory budget (50 MiB)
pub const DEFAULT_MAX_SIZE_BYTES: usize = 50 * 1024 * 1024;

/// Default TTL for entries stored without an explicit TTL
pub const DEFAULT_LOCAL_TTL: Duration = Duration::from_secs(300);

// == Local Cache Config ==
/// Construction-time limits for a [`LocalCache`].
#[derive(Debug, Clone)]
pub struct LocalCacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Maximum aggregate size estimate of all entries
    pub max_size_bytes: usize,
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
    /// Optional prefix isolating this cache's keys
    pub namespace: Option<String>,
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            default_ttl: DEFAULT_LOCAL_TTL,
            namespace: None,
        }
    }
}

// == Local Cache ==
/// Bounded local cache with LRU eviction, TTL expiry and a memory budget.
///
/// Invariants held after every operation returns:
/// - `size_bytes()` equals the sum of the stored entries' size estimates
/// - `len() <= max_entries`
/// - `size_bytes() <= max_size_bytes`
///
/// All methods take `&mut self` (reads update LRU order and lazily drop
/// expired entries); share an instance behind a lock.
#[derive(Debug)]
pub struct LocalCache<V> {
    /// Stored (namespaced) key -> entry
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker over stored keys
    lru: LruTracker,
    /// Running counters
    stats: CacheStats,
    /// Sum of `size_bytes` over `entries`
    current_size_bytes: usize,
    config: LocalCacheConfig,
}

impl<V> LocalCache<V>
where
    V: Clone + Serialize,
{
    // == Constructor ==
    /// Creates an empty cache with the given limits.
    pub fn new(config: LocalCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(config.max_entries, config.max_size_bytes),
            current_size_bytes: 0,
            config,
        }
    }

    /// Creates an empty cache with only an entry ceiling and default TTL,
    /// leaving the memory budget at its default.
    pub fn with_capacity(max_entries: usize, default_ttl: Duration) -> Self {
        Self::new(LocalCacheConfig {
            max_entries,
            default_ttl,
            ..LocalCacheConfig::default()
        })
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry for the key.
    ///
    /// Makes room first: least-recently-used entries are evicted until the
    /// new entry fits the memory budget, then one more if a new key would
    /// exceed the entry ceiling. A value that could never fit (its own
    /// estimate exceeds the budget) is not stored.
    ///
    /// # Arguments
    /// * `key` - Caller key (namespace is applied internally)
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the configured default if None)
    pub fn set(&mut self, key: &str, value: V, ttl: Option<Duration>) {
        let stored_key = self.storage_key(key);
        let size = estimate_size(&value);

        // Overwrite: the old entry's size leaves the aggregate first
        self.remove_stored(&stored_key);

        if self.config.max_entries == 0 || size > self.config.max_size_bytes {
            debug!(
                key = %key,
                size_bytes = size,
                max_size_bytes = self.config.max_size_bytes,
                "value does not fit the local cache, not stored"
            );
            return;
        }

        // Memory budget
        while self.current_size_bytes + size > self.config.max_size_bytes {
            if !self.evict_lru() {
                break;
            }
        }

        // Entry ceiling
        while self.entries.len() >= self.config.max_entries {
            if !self.evict_lru() {
                break;
            }
        }

        let ttl = ttl.unwrap_or(self.config.default_ttl);
        self.entries
            .insert(stored_key.clone(), CacheEntry::new(value, ttl, size));
        self.current_size_bytes += size;
        self.lru.touch(&stored_key);
    }

    // == Get ==
    /// Returns the value if present and unexpired, refreshing its LRU position.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let stored_key = self.storage_key(key);

        if self.drop_if_expired(&stored_key) {
            self.stats.record_miss();
            return None;
        }

        match self.entries.get_mut(&stored_key) {
            Some(entry) => {
                entry.touch();
                let value = entry.value.clone();
                self.lru.touch(&stored_key);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Returns true if an unexpired entry exists. Does not affect LRU order.
    pub fn has(&mut self, key: &str) -> bool {
        let stored_key = self.storage_key(key);
        if self.drop_if_expired(&stored_key) {
            return false;
        }
        self.entries.contains_key(&stored_key)
    }

    // == Delete ==
    /// Removes an entry, returning whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        let stored_key = self.storage_key(key);
        self.remove_stored(&stored_key).is_some()
    }

    // == Delete Pattern ==
    /// Removes every entry whose caller key matches a `*` glob pattern.
    ///
    /// The namespace is stripped before matching, so patterns are written in
    /// the caller's key space. Returns the number of entries removed.
    pub fn delete_pattern(&mut self, pattern: &str) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|stored| {
                self.strip_namespace(stored)
                    .is_some_and(|key| glob_match(pattern, key))
            })
            .cloned()
            .collect();

        for stored_key in &matching {
            self.remove_stored(stored_key);
        }
        matching.len()
    }

    // == Clear ==
    /// Removes all entries and resets the size counter.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.current_size_bytes = 0;
    }

    // == Stats ==
    /// Returns a snapshot of occupancy and counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.entry_count = self.entries.len();
        stats.size_bytes = self.current_size_bytes;
        stats
    }

    // == Purge Expired ==
    /// Removes all expired entries in one pass, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let expired = self.expired_keys();
        let removed = expired
            .iter()
            .filter(|stored_key| self.remove_stored(stored_key).is_some())
            .count();
        self.stats.record_expirations(removed);
        removed
    }

    /// Lists the stored keys of entries that have expired.
    pub fn expired_keys(&self) -> Vec<String> {
        let now = current_timestamp_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(stored_key, _)| stored_key.clone())
            .collect()
    }

    /// Removes a single entry by stored key if it is still expired.
    ///
    /// Used by the sweep task, which re-checks expiry because the entry may
    /// have been overwritten since the key was listed.
    pub fn remove_if_expired(&mut self, stored_key: &str) -> bool {
        self.drop_if_expired(stored_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current aggregate size estimate.
    pub fn size_bytes(&self) -> usize {
        self.current_size_bytes
    }

    pub fn config(&self) -> &LocalCacheConfig {
        &self.config
    }

    // == Internals ==
    fn storage_key(&self, key: &str) -> String {
        match &self.config.namespace {
            Some(namespace) => format!("{namespace}:{key}"),
            None => key.to_string(),
        }
    }

    fn strip_namespace<'a>(&self, stored_key: &'a str) -> Option<&'a str> {
        match &self.config.namespace {
            Some(namespace) => stored_key
                .strip_prefix(namespace.as_str())
                .and_then(|rest| rest.strip_prefix(':')),
            None => Some(stored_key),
        }
    }

    /// Removes an entry and keeps the size counter and LRU index in step.
    fn remove_stored(&mut self, stored_key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(stored_key)?;
        self.current_size_bytes -= entry.size_bytes;
        self.lru.remove(stored_key);
        Some(entry)
    }

    fn drop_if_expired(&mut self, stored_key: &str) -> bool {
        let expired = self
            .entries
            .get(stored_key)
            .is_some_and(|entry| entry.is_expired());
        if expired {
            self.remove_stored(stored_key);
            self.stats.record_expirations(1);
        }
        expired
    }

    fn evict_lru(&mut self) -> bool {
        match self.lru.peek_oldest().cloned() {
            Some(oldest) => {
                self.remove_stored(&oldest);
                self.stats.record_eviction();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn recomputed_size_bytes(&self) -> usize {
        self.entries.values().map(|entry| entry.size_bytes).sum()
    }
}
