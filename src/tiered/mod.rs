//! Tiered Access Module
//!
//! Read-through cache over two tiers: the per-process [`LocalCache`] and a
//! [`SharedCache`]. Lookups go local -> shared -> producer and write results
//! back through both tiers. Tier failures only ever cost a cache miss; the
//! only error a caller sees is its own producer's.

mod batch;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, LocalCache};
use crate::codec::{Codec, JsonCodec};
use crate::config::Config;
use crate::shared::SharedCache;
use crate::tasks::spawn_sweep_task;
use crate::ttl::{TtlInput, TtlPolicy};

pub use batch::{BatchItem, BatchOptions, Producer};

// == Defaults ==
/// Fraction of the shared-tier TTL used for local copies
pub const DEFAULT_LOCAL_TTL_RATIO: f64 = 0.8;

/// Upper bound on the TTL of a local copy
pub const DEFAULT_LOCAL_TTL_CEILING: Duration = Duration::from_secs(3600);

/// Shared handle to a local cache
pub type SharedLocalCache<V> = Arc<RwLock<LocalCache<V>>>;

// == Invalidation Summary ==
/// How many entries an invalidation removed from each tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationSummary {
    pub local_removed: usize,
    pub shared_removed: u64,
}

// == Tiered Cache ==
/// Two-tier read-through cache for values of type `V`.
///
/// Construct once at startup and share by `Arc`. Call [`TieredCache::shutdown`]
/// before exit to stop the background sweep.
pub struct TieredCache<V> {
    local: Option<SharedLocalCache<V>>,
    shared: Arc<dyn SharedCache>,
    codec: Arc<dyn Codec<V>>,
    ttl_policy: TtlPolicy,
    local_ttl_ratio: f64,
    local_ttl_ceiling: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache over an optional local tier and a shared tier,
    /// using JSON payloads and the default TTL policy.
    pub fn new(local: Option<LocalCache<V>>, shared: Arc<dyn SharedCache>) -> Self {
        Self {
            local: local.map(|cache| Arc::new(RwLock::new(cache))),
            shared,
            codec: Arc::new(JsonCodec),
            ttl_policy: TtlPolicy::default(),
            local_ttl_ratio: DEFAULT_LOCAL_TTL_RATIO,
            local_ttl_ceiling: DEFAULT_LOCAL_TTL_CEILING,
            sweeper: Mutex::new(None),
        }
    }

    /// Creates a cache from configuration. The local tier is built only
    /// when enabled.
    pub fn from_config(config: &Config, shared: Arc<dyn SharedCache>) -> Self {
        let local = config
            .local_cache_enabled
            .then(|| LocalCache::new(config.local_cache_config()));
        Self::new(local, shared)
            .with_local_ttl_scaling(config.local_ttl_ratio, config.local_ttl_ceiling)
    }

    pub fn with_codec(mut self, codec: impl Codec<V> + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    /// Sets how local TTLs derive from shared TTLs. `ratio` is clamped to `(0, 1]`.
    pub fn with_local_ttl_scaling(mut self, ratio: f64, ceiling: Duration) -> Self {
        self.local_ttl_ratio = clamp_ratio(ratio);
        self.local_ttl_ceiling = ceiling;
        self
    }

    // == Fetch With Cache ==
    /// Returns the value for `key`, producing and caching it on a full miss.
    ///
    /// # Arguments
    /// * `key` - Cache key
    /// * `ttl` - Seconds or a TTL category name
    /// * `producer` - Computes the value when no tier has it
    ///
    /// # Errors
    /// Only the producer's own error, unchanged.
    pub async fn fetch_with_cache<F, Fut, E>(
        &self,
        key: &str,
        ttl: impl Into<TtlInput>,
        producer: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let ttl_secs = self.resolve_ttl(ttl);

        if let Some(value) = self.local_get(key).await {
            debug!(key = %key, "cache hit (local)");
            return Ok(value);
        }

        if let Some(value) = self.shared_get(key).await {
            debug!(key = %key, "cache hit (shared)");
            self.local_set(key, value.clone(), ttl_secs).await;
            return Ok(value);
        }

        debug!(key = %key, "cache miss, producing");
        let value = producer().await?;
        self.write_through(key, &value, ttl_secs).await;
        Ok(value)
    }

    // == Invalidation ==
    /// Removes keys from both tiers. Never fails; repeating it is a no-op.
    pub async fn invalidate_keys(&self, keys: &[String]) -> InvalidationSummary {
        let mut summary = InvalidationSummary::default();
        if keys.is_empty() {
            return summary;
        }

        if let Some(local) = &self.local {
            let mut cache = local.write().await;
            summary.local_removed = keys.iter().filter(|key| cache.delete(key)).count();
        }

        match self.shared.delete(keys).await {
            Ok(removed) => summary.shared_removed = removed,
            Err(e) => warn!(keys = keys.len(), error = %e, "shared-tier delete failed"),
        }

        debug!(
            keys = keys.len(),
            local_removed = summary.local_removed,
            shared_removed = summary.shared_removed,
            "invalidated keys"
        );
        summary
    }

    /// Removes every key matching a `*` glob from both tiers.
    ///
    /// The shared tier resolves the pattern to concrete keys, which are then
    /// deleted from both tiers. The local tier also applies the pattern to
    /// its own keys, since the tiers may hold different key sets.
    pub async fn invalidate_pattern(&self, pattern: &str) -> InvalidationSummary {
        let resolved = match self.shared.keys_matching(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "shared-tier pattern lookup failed");
                Vec::new()
            }
        };

        let mut summary = InvalidationSummary::default();

        if let Some(local) = &self.local {
            let mut cache = local.write().await;
            let by_key = resolved.iter().filter(|key| cache.delete(key)).count();
            summary.local_removed = by_key + cache.delete_pattern(pattern);
        }

        if !resolved.is_empty() {
            match self.shared.delete(&resolved).await {
                Ok(removed) => summary.shared_removed = removed,
                Err(e) => warn!(pattern = %pattern, error = %e, "shared-tier delete failed"),
            }
        }

        info!(
            pattern = %pattern,
            local_removed = summary.local_removed,
            shared_removed = summary.shared_removed,
            "invalidated pattern"
        );
        summary
    }

    // == Introspection ==
    /// Local-tier statistics, `None` when the local tier is disabled.
    pub async fn local_stats(&self) -> Option<CacheStats> {
        match &self.local {
            Some(local) => Some(local.read().await.stats()),
            None => None,
        }
    }

    pub fn local_enabled(&self) -> bool {
        self.local.is_some()
    }

    /// Whether the shared tier currently answers.
    pub async fn shared_available(&self) -> bool {
        self.shared.ping().await.is_ok()
    }

    /// Drops every local entry. The shared tier is untouched.
    pub async fn clear_local(&self) {
        if let Some(local) = &self.local {
            local.write().await.clear();
        }
    }

    /// TTL given to local copies for a shared-tier TTL of `ttl_secs`.
    pub fn local_ttl(&self, ttl_secs: u64) -> Duration {
        Duration::from_secs_f64(ttl_secs as f64 * self.local_ttl_ratio)
            .min(self.local_ttl_ceiling)
    }

    // == Lifecycle ==
    /// Starts the periodic expiry sweep of the local tier. Restarting
    /// replaces the previous sweep.
    pub async fn start_sweeper(&self, interval: Duration) {
        let Some(local) = &self.local else {
            return;
        };
        let handle = spawn_sweep_task(local.clone(), interval);
        if let Some(previous) = self.sweeper.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Stops the background sweep, if running.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.abort();
            info!("local cache sweep stopped");
        }
    }

    // == Tier Helpers ==
    fn resolve_ttl(&self, ttl: impl Into<TtlInput>) -> u64 {
        self.ttl_policy.resolve(&ttl.into())
    }

    async fn local_get(&self, key: &str) -> Option<V> {
        let local = self.local.as_ref()?;
        let value = local.write().await.get(key);
        value
    }

    /// A zero local TTL skips the local tier: the entry would be dead on arrival.
    async fn local_set(&self, key: &str, value: V, ttl_secs: u64) {
        if let Some(local) = &self.local {
            let ttl = self.local_ttl(ttl_secs);
            if ttl.is_zero() {
                return;
            }
            local.write().await.set(key, value, Some(ttl));
        }
    }

    /// Shared-tier lookup where unreachable tiers and undecodable payloads
    /// both count as misses.
    async fn shared_get(&self, key: &str) -> Option<V> {
        match self.shared.get(key).await {
            Ok(Some(raw)) => self.decode(key, &raw),
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "shared-tier get failed, treating as miss");
                None
            }
        }
    }

    fn decode(&self, key: &str, raw: &str) -> Option<V> {
        match self.codec.decode(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding undecodable shared-tier payload");
                None
            }
        }
    }

    async fn write_through(&self, key: &str, value: &V, ttl_secs: u64) {
        match self.codec.encode(value) {
            Ok(raw) => {
                if let Err(e) = self.shared.set(key, &raw, ttl_secs).await {
                    warn!(key = %key, error = %e, "shared-tier set failed");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "could not encode value for shared tier"),
        }
        self.local_set(key, value.clone(), ttl_secs).await;
    }
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(1.0)
    } else {
        DEFAULT_LOCAL_TTL_RATIO
    }
}
