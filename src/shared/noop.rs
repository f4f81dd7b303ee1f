//! Shared tier stand-in for deployments without one.

use async_trait::async_trait;

use super::{SharedCache, WriteBatch};
use crate::error::Result;

/// Always misses and accepts every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSharedCache;

#[async_trait]
impl SharedCache for NoopSharedCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<()> {
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

    async fn exec_batch(&self, _batch: WriteBatch) -> Result<()> {
        Ok(())
    }
}
