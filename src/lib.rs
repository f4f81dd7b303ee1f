//! Tiercache - a two-tier read-through cache
//!
//! Keeps a bounded per-process cache in front of a shared network cache
//! (Redis), populates both on a miss, and degrades to the caller's
//! producer whenever a tier is unavailable.

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod shared;
pub mod tasks;
pub mod tiered;
pub mod ttl;

pub use api::AppState;
pub use cache::{LocalCache, LocalCacheConfig};
pub use config::Config;
pub use error::CacheError;
pub use shared::SharedCache;
pub use tiered::{BatchItem, BatchOptions, InvalidationSummary, TieredCache};
pub use ttl::{TtlCategory, TtlInput, TtlPolicy};
