//! API Handlers
//!
//! HTTP request handlers for each operator endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::info;

use crate::error::{CacheError, Result};
use crate::models::{
    HealthResponse, InvalidateKeysRequest, InvalidatePatternRequest, InvalidateResponse,
    StatsResponse,
};
use crate::shared::SharedCache;
use crate::tiered::TieredCache;

/// Application state shared across all handlers.
///
/// The server caches arbitrary JSON documents.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TieredCache<Value>>,
}

impl AppState {
    pub fn new(cache: TieredCache<Value>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration and a connected shared tier.
    pub fn from_config(config: &crate::config::Config, shared: Arc<dyn SharedCache>) -> Self {
        Self::new(TieredCache::from_config(config, shared))
    }
}

/// Handler for GET /health
///
/// A down shared tier is reported but does not make the service unhealthy.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let shared_up = state.cache.shared_available().await;
    Json(HealthResponse::healthy(shared_up))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.local_stats().await;
    Json(StatsResponse::from_stats(stats))
}

/// Handler for POST /invalidate
pub async fn invalidate_keys_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateKeysRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let summary = state.cache.invalidate_keys(&req.keys).await;
    info!(
        keys = req.keys.len(),
        local_removed = summary.local_removed,
        shared_removed = summary.shared_removed,
        "operator key invalidation"
    );
    Ok(Json(summary.into()))
}

/// Handler for POST /invalidate/pattern
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let summary = state.cache.invalidate_pattern(&req.pattern).await;
    Ok(Json(summary.into()))
}
