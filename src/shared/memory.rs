//! In-process shared tier.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{SharedCache, WriteBatch};
use crate::cache::{current_timestamp_ms, glob_match};
use crate::error::Result;

/// Raw payload plus its expiry (Unix milliseconds)
type StoredValue = (String, u64);

/// Shared tier kept in process memory.
///
/// Behaves like the Redis tier (expiring string values, glob key listing,
/// batched writes) without a server. Each trait call counts as one round
/// trip, which makes batching observable in tests.
#[derive(Debug, Default)]
pub struct MemorySharedCache {
    entries: RwLock<HashMap<String, StoredValue>>,
    round_trips: AtomicU64,
}

impl MemorySharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trait calls served so far.
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Stores a payload as-is, bypassing the round-trip counter.
    pub async fn insert_raw(&self, key: &str, value: &str, ttl_secs: u64) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_string(), expiry(ttl_secs)));
    }

    /// Returns a live payload, bypassing the round-trip counter.
    pub async fn peek(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        live(&entries, key, current_timestamp_ms())
    }

    /// Number of unexpired keys.
    pub async fn len(&self) -> usize {
        let now = current_timestamp_ms();
        let entries = self.entries.read().await;
        entries.values().filter(|(_, exp)| *exp > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn count_round_trip(&self) {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
    }
}

fn expiry(ttl_secs: u64) -> u64 {
    current_timestamp_ms().saturating_add(ttl_secs.saturating_mul(1000))
}

fn live(entries: &HashMap<String, StoredValue>, key: &str, now: u64) -> Option<String> {
    entries
        .get(key)
        .filter(|(_, exp)| *exp > now)
        .map(|(value, _)| value.clone())
}

#[async_trait]
impl SharedCache for MemorySharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.count_round_trip();
        let entries = self.entries.read().await;
        Ok(live(&entries, key, current_timestamp_ms()))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.count_round_trip();
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_string(), expiry(ttl_secs)));
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        self.count_round_trip();
        let now = current_timestamp_ms();
        let entries = self.entries.read().await;
        Ok(keys.iter().map(|key| live(&entries, key, now)).collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        self.count_round_trip();
        let now = current_timestamp_ms();
        let mut entries = self.entries.write().await;
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|(_, exp)| *exp > now)
            .count();
        Ok(removed as u64)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        self.count_round_trip();
        let now = current_timestamp_ms();
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, (_, exp))| *exp > now && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    async fn exec_batch(&self, batch: WriteBatch) -> Result<()> {
        self.count_round_trip();
        let mut entries = self.entries.write().await;
        for write in batch.into_writes() {
            entries.insert(write.key, (write.value, expiry(write.ttl_secs)));
        }
        Ok(())
    }
}
