//! Expiry Sweep Task
//!
//! Background task that periodically removes expired local cache entries.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::LocalCache;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for `interval` between passes. Stop it by aborting the
/// returned handle (see `TieredCache::shutdown`).
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(LocalCache::<String>::new(LocalCacheConfig::default())));
/// let sweep = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_sweep_task<V>(cache: Arc<RwLock<LocalCache<V>>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs_f64(),
            "starting local cache expiry sweep"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = sweep_expired(&cache).await;
            if removed > 0 {
                info!("expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("expiry sweep: no expired entries found");
            }
        }
    })
}

/// Runs one sweep pass and returns the number of entries removed.
///
/// Expired keys are listed under a read lock, then removed one per write
/// lock acquisition so foreground calls interleave between entries. Each
/// removal re-checks expiry in case the key was rewritten meanwhile.
pub async fn sweep_expired<V>(cache: &RwLock<LocalCache<V>>) -> usize
where
    V: Clone + Serialize,
{
    let candidates = cache.read().await.expired_keys();

    let mut removed = 0;
    for stored_key in candidates {
        if cache.write().await.remove_if_expired(&stored_key) {
            removed += 1;
        }
        tokio::task::yield_now().await;
    }
    removed
}
