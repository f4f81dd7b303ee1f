//! Batched get-or-populate and batched writes.

use std::future::Future;

use futures::future::{self, BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn, Level};

use super::TieredCache;
use crate::shared::WriteBatch;
use crate::ttl::TtlInput;

/// Boxed zero-argument producer for one batch item.
pub type Producer<V, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<V, E>> + Send>;

// == Batch Item ==
/// A key and the producer to run if no tier has it.
pub struct BatchItem<V, E> {
    pub key: String,
    producer: Producer<V, E>,
}

impl<V, E> BatchItem<V, E> {
    pub fn new<F, Fut>(key: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self {
            key: key.into(),
            producer: Box::new(move || producer().boxed()),
        }
    }
}

// == Batch Options ==
/// Controls how a batch runs its producers.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Run producers concurrently instead of one after another
    pub use_parallel: bool,
    /// Record producer failures per item instead of failing the batch
    pub continue_on_error: bool,
    /// Level of the per-batch summary log line
    pub log_level: Level,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            use_parallel: true,
            continue_on_error: false,
            log_level: Level::DEBUG,
        }
    }
}

impl BatchOptions {
    pub fn sequential(mut self) -> Self {
        self.use_parallel = false;
        self
    }

    pub fn continue_on_error(mut self) -> Self {
        self.continue_on_error = true;
        self
    }

    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }
}

/// Per-tier tallies for the summary log line
#[derive(Debug, Default)]
struct BatchTally {
    local_hits: usize,
    shared_hits: usize,
    produced: usize,
    failed: usize,
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Batch Fetch With Cache ==
    /// Get-or-populate for many keys at once.
    ///
    /// Local hits are taken first, then the remaining keys go to the shared
    /// tier in one multi-get, then producers run for whatever is still
    /// missing. Newly produced values are written back through both tiers.
    ///
    /// The result has one entry per input item, in input order. With
    /// `continue_on_error` a failed producer leaves an `Err` in its slot;
    /// otherwise the first producer error fails the whole batch and nothing
    /// produced by it is cached.
    pub async fn batch_fetch_with_cache<E>(
        &self,
        items: Vec<BatchItem<V, E>>,
        ttl: impl Into<TtlInput>,
        options: BatchOptions,
    ) -> Result<Vec<Result<V, E>>, E>
    where
        E: Send + 'static,
    {
        let ttl_secs = self.resolve_ttl(ttl);
        let mut tally = BatchTally::default();
        let mut found: Vec<Option<V>> = Vec::with_capacity(items.len());

        // Local tier, no I/O
        match &self.local {
            Some(local) => {
                let mut cache = local.write().await;
                found.extend(items.iter().map(|item| cache.get(&item.key)));
            }
            None => found.resize(items.len(), None),
        }
        tally.local_hits = found.iter().filter(|v| v.is_some()).count();

        // Shared tier, one round trip for all local misses
        let missing: Vec<usize> = (0..items.len()).filter(|&i| found[i].is_none()).collect();
        if !missing.is_empty() {
            let keys: Vec<String> = missing.iter().map(|&i| items[i].key.clone()).collect();
            match self.shared.mget(&keys).await {
                Ok(raws) if raws.len() == keys.len() => {
                    for (&i, raw) in missing.iter().zip(raws) {
                        let Some(raw) = raw else { continue };
                        if let Some(value) = self.decode(&items[i].key, &raw) {
                            self.local_set(&items[i].key, value.clone(), ttl_secs).await;
                            found[i] = Some(value);
                            tally.shared_hits += 1;
                        }
                    }
                }
                Ok(raws) => warn!(
                    expected = keys.len(),
                    received = raws.len(),
                    "shared-tier multi-get returned the wrong number of values, ignoring"
                ),
                Err(e) => warn!(keys = keys.len(), error = %e, "shared-tier multi-get failed"),
            }
        }

        // Producers for everything still missing, in input order
        let mut pending = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            if found[i].is_none() {
                pending.push((i, item.key, item.producer));
            }
        }

        let produced = self.run_producers(pending, &options).await?;

        // Write-through of fresh values
        let fresh: Vec<(String, V)> = produced
            .iter()
            .filter_map(|(_, key, outcome)| {
                outcome.as_ref().ok().map(|v| (key.clone(), v.clone()))
            })
            .collect();
        self.batch_cache_set(fresh, ttl_secs).await;

        // Merge, every miss has exactly one outcome and both lists are in index order
        let mut produced = produced.into_iter().peekable();
        let mut results = Vec::with_capacity(found.len());
        for (i, hit) in found.into_iter().enumerate() {
            match hit {
                Some(value) => results.push(Ok(value)),
                None => {
                    if let Some((_, _, outcome)) = produced.next_if(|(idx, _, _)| *idx == i) {
                        match &outcome {
                            Ok(_) => tally.produced += 1,
                            Err(_) => tally.failed += 1,
                        }
                        results.push(outcome);
                    }
                }
            }
        }

        log_summary(options.log_level, results.len(), &tally);
        Ok(results)
    }

    async fn run_producers<E>(
        &self,
        pending: Vec<(usize, String, Producer<V, E>)>,
        options: &BatchOptions,
    ) -> Result<Vec<(usize, String, Result<V, E>)>, E>
    where
        E: Send + 'static,
    {
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let (slots, producers): (Vec<(usize, String)>, Vec<Producer<V, E>>) = pending
            .into_iter()
            .map(|(i, key, producer)| ((i, key), producer))
            .unzip();

        let outcomes: Vec<Result<V, E>> = match (options.use_parallel, options.continue_on_error) {
            (true, true) => future::join_all(producers.into_iter().map(|p| p())).await,
            (true, false) => future::try_join_all(producers.into_iter().map(|p| p()))
                .await?
                .into_iter()
                .map(Ok)
                .collect(),
            (false, continue_on_error) => {
                let mut outcomes = Vec::with_capacity(producers.len());
                for producer in producers {
                    match producer().await {
                        Err(e) if !continue_on_error => return Err(e),
                        outcome => outcomes.push(outcome),
                    }
                }
                outcomes
            }
        };

        Ok(slots
            .into_iter()
            .zip(outcomes)
            .map(|((i, key), outcome)| (i, key, outcome))
            .collect())
    }

    // == Batch Cache Set ==
    /// Writes many values to both tiers.
    ///
    /// Local writes happen immediately; shared-tier writes go out as a single
    /// pipelined round trip. Failures are logged and swallowed.
    pub async fn batch_cache_set(&self, items: Vec<(String, V)>, ttl: impl Into<TtlInput>) {
        if items.is_empty() {
            return;
        }
        let ttl_secs = self.resolve_ttl(ttl);
        let mut batch = WriteBatch::new();

        for (key, value) in &items {
            match self.codec.encode(value) {
                Ok(raw) => batch.set(key.clone(), raw, ttl_secs),
                Err(e) => warn!(key = %key, error = %e, "could not encode value for shared tier"),
            }
        }

        let ttl = self.local_ttl(ttl_secs);
        if let (Some(local), false) = (&self.local, ttl.is_zero()) {
            let mut cache = local.write().await;
            for (key, value) in items {
                cache.set(&key, value, Some(ttl));
            }
        }

        let count = batch.len();
        match self.shared.exec_batch(batch).await {
            Ok(()) => debug!(count, ttl_secs, "batch cache set"),
            Err(e) => warn!(count, error = %e, "shared-tier batch write failed"),
        }
    }
}

fn log_summary(level: Level, total: usize, tally: &BatchTally) {
    macro_rules! summary {
        ($macro:ident) => {
            tracing::$macro!(
                total,
                local_hits = tally.local_hits,
                shared_hits = tally.shared_hits,
                produced = tally.produced,
                failed = tally.failed,
                "batch fetch complete"
            )
        };
    }

    if level == Level::ERROR {
        summary!(error);
    } else if level == Level::WARN {
        summary!(warn);
    } else if level == Level::INFO {
        summary!(info);
    } else if level == Level::DEBUG {
        summary!(debug);
    } else {
        summary!(trace);
    }
}
