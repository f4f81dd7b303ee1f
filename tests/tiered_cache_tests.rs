//! Integration Tests for the Tiered Cache
//!
//! Exercises lookup order, write-through, batching and degraded tiers
//! against in-process shared tier doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tiercache::{
    cache::{LocalCache, LocalCacheConfig},
    codec::FnCodec,
    error::{CacheError, Result},
    shared::{MemorySharedCache, SharedCache, WriteBatch},
    ttl::{TtlInput, LIVE_TTL_SECS, REFERENCE_TTL_SECS, SCHEDULE_TTL_SECS},
    BatchItem, BatchOptions, TieredCache, TtlPolicy,
};
use tokio_test::assert_ok;

// == Test Doubles ==

/// Shared tier whose every call fails.
struct FailingSharedCache;

fn down() -> CacheError {
    CacheError::TierUnavailable("connection refused".to_string())
}

#[async_trait]
impl SharedCache for FailingSharedCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(down())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<()> {
        Err(down())
    }

    async fn mget(&self, _keys: &[String]) -> Result<Vec<Option<String>>> {
        Err(down())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64> {
        Err(down())
    }

    async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>> {
        Err(down())
    }

    async fn exec_batch(&self, _batch: WriteBatch) -> Result<()> {
        Err(down())
    }

    async fn ping(&self) -> Result<()> {
        Err(down())
    }
}

/// Shared tier that records the TTL of every write.
#[derive(Default)]
struct RecordingSharedCache {
    writes: Mutex<Vec<(String, u64)>>,
}

impl RecordingSharedCache {
    fn ttl_of(&self, key: &str) -> Option<u64> {
        let writes = self.writes.lock().unwrap();
        writes.iter().rev().find(|(k, _)| k == key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl SharedCache for RecordingSharedCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, key: &str, _value: &str, ttl_secs: u64) -> Result<()> {
        self.writes.lock().unwrap().push((key.to_string(), ttl_secs));
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        Ok(vec![None; keys.len()])
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64> {
        Ok(0)
    }

    async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn exec_batch(&self, batch: WriteBatch) -> Result<()> {
        let mut writes = self.writes.lock().unwrap();
        writes.extend(batch.into_writes().into_iter().map(|w| (w.key, w.ttl_secs)));
        Ok(())
    }
}

// == Helper Functions ==

fn local() -> Option<LocalCache<String>> {
    Some(LocalCache::new(LocalCacheConfig::default()))
}

fn tiered(shared: Arc<MemorySharedCache>) -> TieredCache<String> {
    TieredCache::new(local(), shared)
}

fn counted(
    calls: &Arc<AtomicUsize>,
    value: &str,
) -> impl std::future::Future<Output = std::result::Result<String, String>> {
    calls.fetch_add(1, Ordering::SeqCst);
    let value = value.to_string();
    async move { Ok(value) }
}

// == Fetch With Cache ==

#[tokio::test]
async fn test_producer_runs_once_then_local_hit() {
    let shared = Arc::new(MemorySharedCache::new());
    let cache = tiered(shared.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let first = assert_ok!(
        cache
            .fetch_with_cache("players:1", 60u64, || counted(&calls, "salah"))
            .await
    );
    let trips_after_first = shared.round_trips();
    let second = assert_ok!(
        cache
            .fetch_with_cache("players:1", 60u64, || counted(&calls, "other"))
            .await
    );

    assert_eq!(first, "salah");
    assert_eq!(second, "salah");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // Local hit never reaches the shared tier
    assert_eq!(shared.round_trips(), trips_after_first);
    assert_eq!(shared.peek("players:1").await.as_deref(), Some("\"salah\""));
}

#[tokio::test]
async fn test_shared_hit_populates_local() {
    let shared = Arc::new(MemorySharedCache::new());
    shared.insert_raw("teams:1", "\"arsenal\"", 600).await;
    let cache = tiered(shared.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let value = assert_ok!(
        cache
            .fetch_with_cache("teams:1", 60u64, || counted(&calls, "unused"))
            .await
    );
    assert_eq!(value, "arsenal");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(cache.local_stats().await.unwrap().entry_count, 1);

    // Second read is served locally
    let trips = shared.round_trips();
    assert_ok!(
        cache
            .fetch_with_cache("teams:1", 60u64, || counted(&calls, "unused"))
            .await
    );
    assert_eq!(shared.round_trips(), trips);
}

#[tokio::test]
async fn test_undecodable_shared_payload_is_a_miss() {
    let shared = Arc::new(MemorySharedCache::new());
    shared.insert_raw("k", "{not json", 600).await;
    let cache = tiered(shared.clone());

    let value = assert_ok!(
        cache
            .fetch_with_cache("k", 60u64, || async { Ok::<_, String>("fresh".to_string()) })
            .await
    );

    assert_eq!(value, "fresh");
    assert_eq!(shared.peek("k").await.as_deref(), Some("\"fresh\""));
}

#[tokio::test]
async fn test_producer_error_is_returned_unchanged() {
    #[derive(Debug, PartialEq)]
    struct UpstreamDown(u16);

    let shared = Arc::new(MemorySharedCache::new());
    let cache = tiered(shared.clone());

    let result = cache
        .fetch_with_cache("k", 60u64, || async { Err::<String, _>(UpstreamDown(503)) })
        .await;

    assert_eq!(result, Err(UpstreamDown(503)));
    assert!(shared.is_empty().await);
    assert_eq!(cache.local_stats().await.unwrap().entry_count, 0);
}

#[tokio::test]
async fn test_unavailable_shared_tier_degrades_to_producer() {
    let cache: TieredCache<String> = TieredCache::new(local(), Arc::new(FailingSharedCache));
    let calls = Arc::new(AtomicUsize::new(0));

    let value = assert_ok!(
        cache
            .fetch_with_cache("k", 60u64, || counted(&calls, "v"))
            .await
    );
    assert_eq!(value, "v");

    // Still cached locally
    assert_ok!(cache.fetch_with_cache("k", 60u64, || counted(&calls, "v")).await);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cache.shared_available().await);

    let summary = cache.invalidate_pattern("*").await;
    assert_eq!(summary.local_removed, 1);
    assert_eq!(summary.shared_removed, 0);
}

#[tokio::test]
async fn test_category_ttls_reach_shared_tier() {
    let shared = Arc::new(RecordingSharedCache::default());
    let cache: TieredCache<String> = TieredCache::new(None, shared.clone());

    for (key, category) in [("a", "reference"), ("b", "schedule"), ("c", "live"), ("d", "bogus")] {
        assert_ok!(
            cache
                .fetch_with_cache(key, category, || async { Ok::<_, String>(key.to_string()) })
                .await
        );
    }
    assert_ok!(
        cache
            .fetch_with_cache("e", TtlInput::Seconds(42), || async {
                Ok::<_, String>("e".to_string())
            })
            .await
    );

    assert_eq!(shared.ttl_of("a"), Some(REFERENCE_TTL_SECS));
    assert_eq!(shared.ttl_of("b"), Some(SCHEDULE_TTL_SECS));
    assert_eq!(shared.ttl_of("c"), Some(LIVE_TTL_SECS));
    assert_eq!(shared.ttl_of("d"), Some(SCHEDULE_TTL_SECS));
    assert_eq!(shared.ttl_of("e"), Some(42));
}

// == Invalidation ==

#[tokio::test]
async fn test_invalidate_keys_is_idempotent() {
    let shared = Arc::new(MemorySharedCache::new());
    let cache = tiered(shared.clone());
    assert_ok!(
        cache
            .fetch_with_cache("k", 60u64, || async { Ok::<_, String>("v".to_string()) })
            .await
    );

    let keys = vec!["k".to_string()];
    let first = cache.invalidate_keys(&keys).await;
    let second = cache.invalidate_keys(&keys).await;

    assert_eq!((first.local_removed, first.shared_removed), (1, 1));
    assert_eq!((second.local_removed, second.shared_removed), (0, 0));
    assert!(cache.invalidate_keys(&[]).await.local_removed == 0);
}

#[tokio::test]
async fn test_invalidate_pattern_spans_both_tiers() {
    let shared = Arc::new(MemorySharedCache::new());
    // Present only in the shared tier
    shared.insert_raw("fixtures:gw1", "\"x\"", 600).await;
    let cache = tiered(shared.clone());
    for key in ["fixtures:gw2", "fixtures:gw3", "teams:1"] {
        assert_ok!(
            cache
                .fetch_with_cache(key, 60u64, || async { Ok::<_, String>("v".to_string()) })
                .await
        );
    }

    let summary = cache.invalidate_pattern("fixtures:*").await;

    assert_eq!(summary.shared_removed, 3);
    assert_eq!(summary.local_removed, 2);
    assert_eq!(shared.len().await, 1);
    assert!(shared.peek("teams:1").await.is_some());
    assert_eq!(cache.local_stats().await.unwrap().entry_count, 1);
}

// == Batch Fetch ==

fn item(key: &str, value: &str) -> BatchItem<String, String> {
    let value = value.to_string();
    BatchItem::new(key, move || async move { Ok(value) })
}

fn failing_item(key: &str) -> BatchItem<String, String> {
    let key_owned = key.to_string();
    BatchItem::new(key, move || async move { Err(format!("{} failed", key_owned)) })
}

#[tokio::test]
async fn test_batch_fetch_preserves_order_across_tiers() {
    let shared = Arc::new(MemorySharedCache::new());
    shared.insert_raw("b", "\"shared-b\"", 600).await;
    let cache = tiered(shared.clone());
    assert_ok!(
        cache
            .fetch_with_cache("a", 60u64, || async { Ok::<_, String>("local-a".to_string()) })
            .await
    );

    let items = vec![
        item("c", "produced-c"),
        item("a", "unused"),
        item("b", "unused"),
        item("d", "produced-d"),
    ];
    let results = assert_ok!(
        cache
            .batch_fetch_with_cache(items, 60u64, BatchOptions::default())
            .await
    );

    let values: Vec<String> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(values, vec!["produced-c", "local-a", "shared-b", "produced-d"]);
    assert_eq!(shared.peek("c").await.as_deref(), Some("\"produced-c\""));
    assert_eq!(shared.peek("d").await.as_deref(), Some("\"produced-d\""));
    assert_eq!(cache.local_stats().await.unwrap().entry_count, 4);
}

#[tokio::test]
async fn test_batch_partial_decode_failure_requeues_only_that_key() {
    let shared = Arc::new(MemorySharedCache::new());
    shared.insert_raw("good", "\"g\"", 600).await;
    shared.insert_raw("bad", "{nope", 600).await;
    let cache = tiered(shared.clone());
    let bad_calls = Arc::new(AtomicUsize::new(0));
    let good_calls = Arc::new(AtomicUsize::new(0));

    let items = vec![
        {
            let calls = bad_calls.clone();
            BatchItem::new("bad", move || counted(&calls, "fresh"))
        },
        {
            let calls = good_calls.clone();
            BatchItem::new("good", move || counted(&calls, "unused"))
        },
    ];
    let results = assert_ok!(
        cache
            .batch_fetch_with_cache(items, 60u64, BatchOptions::default())
            .await
    );

    let values: Vec<String> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(values, vec!["fresh", "g"]);
    assert_eq!(bad_calls.load(Ordering::SeqCst), 1);
    assert_eq!(good_calls.load(Ordering::SeqCst), 0);
    assert_eq!(shared.peek("bad").await.as_deref(), Some("\"fresh\""));
}

#[tokio::test]
async fn test_batch_continue_on_error_keeps_slots() {
    let shared = Arc::new(MemorySharedCache::new());
    let cache = tiered(shared.clone());

    let items = vec![item("a", "1"), failing_item("b"), item("c", "3")];
    let results = assert_ok!(
        cache
            .batch_fetch_with_cache(items, 60u64, BatchOptions::default().continue_on_error())
            .await
    );

    assert_eq!(results.len(), 3);
    assert_eq!(results[0], Ok("1".to_string()));
    assert_eq!(results[1], Err("b failed".to_string()));
    assert_eq!(results[2], Ok("3".to_string()));
    assert!(shared.peek("b").await.is_none());
    assert!(shared.peek("c").await.is_some());
}

#[tokio::test]
async fn test_batch_fail_fast_caches_nothing() {
    for options in [BatchOptions::default(), BatchOptions::default().sequential()] {
        let shared = Arc::new(MemorySharedCache::new());
        let cache = tiered(shared.clone());

        let items = vec![item("a", "1"), failing_item("b"), item("c", "3")];
        let result = cache.batch_fetch_with_cache(items, 60u64, options).await;

        assert_eq!(result.err().as_deref(), Some("b failed"));
        assert!(shared.is_empty().await);
        assert_eq!(cache.local_stats().await.unwrap().entry_count, 0);
    }
}

#[tokio::test]
async fn test_batch_sequential_runs_in_input_order() {
    let cache = tiered(Arc::new(MemorySharedCache::new()));
    let order = Arc::new(Mutex::new(Vec::new()));

    let items: Vec<BatchItem<String, String>> = ["x", "y", "z"]
        .into_iter()
        .map(|key| {
            let order = order.clone();
            BatchItem::new(key, move || async move {
                order.lock().unwrap().push(key);
                Ok(key.to_uppercase())
            })
        })
        .collect();

    let results = assert_ok!(
        cache
            .batch_fetch_with_cache(items, 60u64, BatchOptions::default().sequential())
            .await
    );

    assert_eq!(*order.lock().unwrap(), vec!["x", "y", "z"]);
    assert_eq!(results[2], Ok("Z".to_string()));
}

#[tokio::test]
async fn test_batch_fetch_with_empty_input() {
    let shared = Arc::new(MemorySharedCache::new());
    let cache = tiered(shared.clone());

    let results = assert_ok!(
        cache
            .batch_fetch_with_cache(
                Vec::<BatchItem<String, String>>::new(),
                60u64,
                BatchOptions::default(),
            )
            .await
    );
    assert!(results.is_empty());
    assert_eq!(shared.round_trips(), 0);
}

#[tokio::test]
async fn test_batch_survives_unavailable_shared_tier() {
    let cache: TieredCache<String> = TieredCache::new(local(), Arc::new(FailingSharedCache));

    let results = assert_ok!(
        cache
            .batch_fetch_with_cache(
                vec![item("a", "1"), item("b", "2")],
                60u64,
                BatchOptions::default(),
            )
            .await
    );

    assert_eq!(results.len(), 2);
    assert_eq!(cache.local_stats().await.unwrap().entry_count, 2);
}

// == Batch Cache Set ==

#[tokio::test]
async fn test_batch_cache_set_is_one_round_trip() {
    let shared = Arc::new(MemorySharedCache::new());
    let cache = tiered(shared.clone());

    let items: Vec<(String, String)> = (0..25)
        .map(|i| (format!("gw:{}", i), format!("fixture {}", i)))
        .collect();
    cache.batch_cache_set(items, "live").await;

    assert_eq!(shared.round_trips(), 1);
    assert_eq!(shared.len().await, 25);
    assert_eq!(cache.local_stats().await.unwrap().entry_count, 25);
}

// == Custom Codec And TTL Policy ==

fn tagged_codec() -> FnCodec<
    String,
    impl Fn(&String) -> Result<String> + Send + Sync,
    impl Fn(&str) -> Result<String> + Send + Sync,
> {
    FnCodec::new(
        |value: &String| Ok(format!("v1:{}", value)),
        |raw: &str| {
            raw.strip_prefix("v1:")
                .map(str::to_string)
                .ok_or_else(|| CacheError::Deserialization(format!("untagged payload {}", raw)))
        },
    )
}

#[tokio::test]
async fn test_custom_codec_round_trips_through_shared_tier() {
    let shared = Arc::new(MemorySharedCache::new());
    let cache = tiered(shared.clone()).with_codec(tagged_codec());
    let calls = Arc::new(AtomicUsize::new(0));

    assert_ok!(
        cache
            .fetch_with_cache("k", 60u64, || counted(&calls, "hello"))
            .await
    );
    assert_eq!(shared.peek("k").await.as_deref(), Some("v1:hello"));

    // Next read must come from the shared tier through the codec
    cache.clear_local().await;
    assert_eq!(cache.local_stats().await.unwrap().entry_count, 0);
    let value = assert_ok!(
        cache
            .fetch_with_cache("k", 60u64, || counted(&calls, "unused"))
            .await
    );
    assert_eq!(value, "hello");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Payloads the codec rejects are misses
    shared.insert_raw("plain", "\"json\"", 600).await;
    let value = assert_ok!(
        cache
            .fetch_with_cache("plain", 60u64, || counted(&calls, "produced"))
            .await
    );
    assert_eq!(value, "produced");
}

#[tokio::test]
async fn test_custom_ttl_policy_categories() {
    let shared = Arc::new(RecordingSharedCache::default());
    let policy = TtlPolicy::new()
        .with_category("gameweek", 900)
        .with_fallback(30);
    let cache: TieredCache<String> =
        TieredCache::new(None, shared.clone()).with_ttl_policy(policy);

    for (key, category) in [("a", "gameweek"), ("b", "live"), ("c", "bogus")] {
        assert_ok!(
            cache
                .fetch_with_cache(key, category, || async { Ok::<_, String>(key.to_string()) })
                .await
        );
    }

    assert_eq!(shared.ttl_of("a"), Some(900));
    assert_eq!(shared.ttl_of("b"), Some(LIVE_TTL_SECS));
    assert_eq!(shared.ttl_of("c"), Some(30));
}
