//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expiry sweep: removes expired local entries nobody reads again

mod sweep;

pub use sweep::{spawn_sweep_task, sweep_expired};
