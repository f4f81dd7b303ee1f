//! Shared Tier Module
//!
//! The network cache shared by every process. The orchestrator only sees
//! the [`SharedCache`] trait; implementations decide how to talk to the
//! backing service.
//!
//! # Implementations
//! - [`RedisSharedCache`]: pooled Redis connections (production)
//! - [`MemorySharedCache`]: in-process map with expiry (development, tests)
//! - [`NoopSharedCache`]: always misses, always succeeds (no shared tier configured)

mod memory;
mod noop;
mod redis_backend;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemorySharedCache;
pub use self::noop::NoopSharedCache;
pub use self::redis_backend::RedisSharedCache;

// == Write Batch ==
/// A single buffered write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWrite {
    pub key: String,
    pub value: String,
    pub ttl_secs: u64,
}

/// Buffered writes sent to the shared tier in one round trip.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a set-with-expiry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>, ttl_secs: u64) {
        self.writes.push(BatchWrite {
            key: key.into(),
            value: value.into(),
            ttl_secs,
        });
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[BatchWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<BatchWrite> {
        self.writes
    }
}

// == Shared Cache Trait ==
/// Client interface to the shared cache tier.
///
/// Every method may fail with [`CacheError::TierUnavailable`]; callers in
/// this crate treat that as a miss.
///
/// [`CacheError::TierUnavailable`]: crate::error::CacheError::TierUnavailable
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Returns the raw payload stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a raw payload with an expiry.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Looks up many keys in one round trip. The result has one slot per key, in order.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Deletes keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64>;

    /// Lists the keys currently matching a `*` glob pattern.
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>>;

    /// Applies all buffered writes in a single pipelined round trip.
    async fn exec_batch(&self, batch: WriteBatch) -> Result<()>;

    /// Checks that the tier is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
