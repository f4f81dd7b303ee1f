//! Redis-backed shared tier.

use async_trait::async_trait;
use deadpool_redis::{Config as PoolSettings, Connection, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use tracing::debug;

use super::{SharedCache, WriteBatch};
use crate::error::{CacheError, Result};

/// Keys requested per SCAN iteration
const SCAN_COUNT: usize = 500;

/// Shared tier on Redis using a deadpool connection pool.
///
/// Pattern listing walks the keyspace with `SCAN ... MATCH` rather than
/// `KEYS`, so it never blocks the server. Every Redis glob metacharacter
/// except `*` is escaped, matching the local tier's semantics.
#[derive(Clone)]
pub struct RedisSharedCache {
    pool: Pool,
}

impl RedisSharedCache {
    /// Builds a pool for `url`. Connections are opened lazily, so an
    /// unreachable server surfaces on first use, not here.
    pub fn connect(url: &str, max_connections: usize) -> Result<Self> {
        let mut settings = PoolSettings::from_url(url);
        settings.pool = Some(PoolConfig::new(max_connections));
        let pool = settings
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::TierUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<Connection> {
        Ok(self.pool.get().await?)
    }
}

/// Escapes `?`, `[`, `]` and `\` so only `*` stays a wildcard in `MATCH`.
fn escape_match_pattern(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '?' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl SharedCache for RedisSharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn().await?;
        // SETEX rejects a zero expiry
        conn.set_ex::<_, _, ()>(key, value, ttl_secs.max(1)).await?;
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn().await?;
        let values: Vec<Option<String>> =
            redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        let removed: u64 = conn.del(keys).await?;
        Ok(removed)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let match_pattern = escape_match_pattern(pattern);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&match_pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort_unstable();
        keys.dedup();
        debug!(pattern = %pattern, matched = keys.len(), "resolved shared-tier pattern");
        Ok(keys)
    }

    async fn exec_batch(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        for write in batch.writes() {
            pipe.set_ex(&write.key, &write.value, write.ttl_secs.max(1))
                .ignore();
        }

        let mut conn = self.conn().await?;
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
