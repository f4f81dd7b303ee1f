//! API Module
//!
//! Operator HTTP surface over a running [`crate::TieredCache`].
//!
//! # Endpoints
//! - `GET /health` - Liveness plus shared tier reachability
//! - `GET /stats` - Local tier statistics
//! - `POST /invalidate` - Remove keys from both tiers
//! - `POST /invalidate/pattern` - Remove keys matching a glob from both tiers

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
