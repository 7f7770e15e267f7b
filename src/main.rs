//! Ad Service binary
//!
//! Loads configuration, connects the backends, and serves the HTTP API until
//! SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use ad_service::cache::{KeyValueCache, MemoryCache, RedisCache};
use ad_service::config::{CacheBackend, Config, StoreBackend};
use ad_service::metrics::Metrics;
use ad_service::store::{AdStore, MemoryAdStore, MySqlAdStore};
use ad_service::{
    create_router, spawn_cleanup_task, telemetry, AdServiceImpl, AppState, CachedAdRepository,
};

/// # Startup Sequence
/// 1. Load configuration from file and environment
/// 2. Initialize the tracing subscriber and optional OTLP export
/// 3. Connect the store and the cache, failing fast when unreachable
/// 4. Build repository, service and router around one metrics handle
/// 5. Serve until a shutdown signal, then drain, close the pool, flush spans
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    telemetry::init(&config.logger, &config.tracing)?;

    info!(
        store = ?config.database.backend,
        cache = ?config.cache.backend,
        ttl_secs = config.cache.ttl_secs,
        otlp_endpoint = config.tracing.otlp_endpoint(),
        "starting ad service"
    );

    let (store, pool) = connect_store(&config).await?;
    let (cache, cleanup_handle) = connect_cache(&config).await?;

    let (metrics, prometheus) = Metrics::prometheus().context("building metrics recorder")?;
    let repository = CachedAdRepository::new(store, cache, metrics.clone(), config.cache.ttl());
    let service = AdServiceImpl::new(Arc::new(repository), metrics.clone());
    let state = AppState::new(Arc::new(service), metrics).with_prometheus(prometheus);

    let app = create_router(state, Duration::from_secs(config.http.timeout_secs));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("serving http")?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("database pool closed");
    }
    info!("server shutdown complete");
    telemetry::shutdown();
    Ok(())
}

async fn connect_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn AdStore>, Option<MySqlAdStore>)> {
    match config.database.backend {
        StoreBackend::Mysql => {
            let store = MySqlAdStore::connect(&config.database)
                .await
                .context("connecting to mysql")?;
            info!("mysql store connected");
            let shared: Arc<dyn AdStore> = Arc::new(store.clone());
            Ok((shared, Some(store)))
        }
        StoreBackend::Memory => {
            warn!("using in-memory store; data is lost on restart");
            let shared: Arc<dyn AdStore> = Arc::new(MemoryAdStore::new());
            Ok((shared, None))
        }
    }
}

async fn connect_cache(
    config: &Config,
) -> anyhow::Result<(Arc<dyn KeyValueCache>, Option<JoinHandle<()>>)> {
    match config.cache.backend {
        CacheBackend::Redis => {
            let cache = RedisCache::connect(&config.cache)
                .await
                .context("connecting to redis")?;
            info!(addr = %config.cache.addr, "redis cache connected");
            let shared: Arc<dyn KeyValueCache> = Arc::new(cache);
            Ok((shared, None))
        }
        CacheBackend::Memory => {
            let cache = MemoryCache::new(config.cache.max_entries);
            let handle = spawn_cleanup_task(cache.clone(), config.cache.cleanup_interval_secs);
            info!(
                max_entries = config.cache.max_entries,
                "in-process cache initialized"
            );
            let shared: Arc<dyn KeyValueCache> = Arc::new(cache);
            Ok((shared, Some(handle)))
        }
    }
}

/// Waits for Ctrl+C or SIGTERM, then aborts the cleanup task if one runs.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("received SIGTERM, initiating shutdown");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("cache cleanup task aborted");
    }
}
