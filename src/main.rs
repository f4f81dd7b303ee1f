//! Tiercache operator server
//!
//! Runs a [`TieredCache`] of JSON documents and exposes its health, stats
//! and invalidation over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiercache::api::{create_router, AppState};
use tiercache::shared::{NoopSharedCache, RedisSharedCache, SharedCache};
use tiercache::Config;

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the shared tier, falling back to none
/// 4. Build the tiered cache and start the local expiry sweep
/// 5. Serve the operator API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiercache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: local_enabled={}, max_entries={}, max_size_bytes={}, port={}, sweep_interval={}s",
        config.local_cache_enabled,
        config.local_max_entries,
        config.local_max_size_bytes,
        config.server_port,
        config.sweep_interval.as_secs()
    );

    let shared = connect_shared_tier(&config);
    let state = AppState::from_config(&config, shared);
    state.cache.start_sweeper(config.sweep_interval).await;
    info!("Tiered cache initialized");

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.cache.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Builds the shared tier. A missing or unusable URL runs without one.
fn connect_shared_tier(config: &Config) -> Arc<dyn SharedCache> {
    let Some(url) = &config.redis_url else {
        info!("REDIS_URL not set, running without a shared tier");
        return Arc::new(NoopSharedCache);
    };

    match RedisSharedCache::connect(url, config.redis_pool_size) {
        Ok(redis) => {
            info!(pool_size = config.redis_pool_size, "shared tier configured");
            Arc::new(redis)
        }
        Err(e) => {
            warn!(error = %e, "could not configure shared tier, running without one");
            Arc::new(NoopSharedCache)
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
