//! Cache Module
//!
//! Bounded in-process cache tier with TTL expiration, LRU eviction and a
//! memory budget.

mod entry;
mod lru;
mod pattern;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, estimate_size, CacheEntry};
pub use lru::LruTracker;
pub use pattern::glob_match;
pub use stats::CacheStats;
pub use store::{
    LocalCache, LocalCacheConfig, DEFAULT_LOCAL_TTL, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_SIZE_BYTES,
};
