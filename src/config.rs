//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{LocalCacheConfig, DEFAULT_LOCAL_TTL, DEFAULT_MAX_ENTRIES};
use crate::tiered::{DEFAULT_LOCAL_TTL_CEILING, DEFAULT_LOCAL_TTL_RATIO};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether the per-process tier is used at all
    pub local_cache_enabled: bool,
    /// Maximum number of local entries
    pub local_max_entries: usize,
    /// Local memory budget in bytes
    pub local_max_size_bytes: usize,
    /// TTL for local entries stored without one
    pub local_default_ttl: Duration,
    /// Fraction of the shared TTL given to local copies
    pub local_ttl_ratio: f64,
    /// Upper bound on local TTLs
    pub local_ttl_ceiling: Duration,
    /// Optional key prefix for the local tier
    pub namespace: Option<String>,
    /// Background sweep interval
    pub sweep_interval: Duration,
    /// Shared tier connection URL, `None` disables the shared tier
    pub redis_url: Option<String>,
    /// Maximum pooled shared-tier connections
    pub redis_pool_size: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LOCAL_CACHE_ENABLED` - Use the local tier (default: true)
    /// - `LOCAL_CACHE_MAX_ENTRIES` - Maximum local entries (default: 1000)
    /// - `LOCAL_CACHE_MAX_SIZE_MB` - Local memory budget in MiB (default: 50)
    /// - `LOCAL_CACHE_DEFAULT_TTL` - Default local TTL in seconds (default: 300)
    /// - `LOCAL_TTL_RATIO` - Local/shared TTL ratio (default: 0.8)
    /// - `LOCAL_TTL_CEILING` - Maximum local TTL in seconds (default: 3600)
    /// - `CACHE_NAMESPACE` - Local key prefix (default: none)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    /// - `REDIS_URL` - Shared tier URL (default: none, shared tier disabled)
    /// - `REDIS_POOL_SIZE` - Shared tier connection pool size (default: 16)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            local_cache_enabled: parse_env("LOCAL_CACHE_ENABLED")
                .unwrap_or(defaults.local_cache_enabled),
            local_max_entries: parse_env("LOCAL_CACHE_MAX_ENTRIES")
                .unwrap_or(defaults.local_max_entries),
            local_max_size_bytes: parse_env::<usize>("LOCAL_CACHE_MAX_SIZE_MB")
                .map(|mb| mb.saturating_mul(BYTES_PER_MB))
                .unwrap_or(defaults.local_max_size_bytes),
            local_default_ttl: parse_env::<u64>("LOCAL_CACHE_DEFAULT_TTL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.local_default_ttl),
            local_ttl_ratio: parse_env::<f64>("LOCAL_TTL_RATIO")
                .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
                .map(|ratio| ratio.min(1.0))
                .unwrap_or(defaults.local_ttl_ratio),
            local_ttl_ceiling: parse_env::<u64>("LOCAL_TTL_CEILING")
                .map(Duration::from_secs)
                .unwrap_or(defaults.local_ttl_ceiling),
            namespace: env::var("CACHE_NAMESPACE").ok().filter(|ns| !ns.is_empty()),
            sweep_interval: parse_env::<u64>("SWEEP_INTERVAL")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            redis_pool_size: parse_env::<usize>("REDIS_POOL_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.redis_pool_size),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Local-tier settings for [`crate::cache::LocalCache::new`].
    pub fn local_cache_config(&self) -> LocalCacheConfig {
        LocalCacheConfig {
            max_entries: self.local_max_entries,
            max_size_bytes: self.local_max_size_bytes,
            default_ttl: self.local_default_ttl,
            namespace: self.namespace.clone(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_cache_enabled: true,
            local_max_entries: DEFAULT_MAX_ENTRIES,
            local_max_size_bytes: 50 * BYTES_PER_MB,
            local_default_ttl: DEFAULT_LOCAL_TTL,
            local_ttl_ratio: DEFAULT_LOCAL_TTL_RATIO,
            local_ttl_ceiling: DEFAULT_LOCAL_TTL_CEILING,
            namespace: None,
            sweep_interval: Duration::from_secs(60),
            redis_url: None,
            redis_pool_size: 16,
            server_port: 3000,
        }
    }
}
