//! Docview Cache
//!
//! Composition root for the document cache: preloads the paths given on
//! the command line, keeps the expiration sweep running until shutdown and
//! prints cache statistics as JSON on exit.

use std::time::Duration;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docview_cache::cache::DEFAULT_CLEANUP_INTERVAL;
use docview_cache::config::{self, CacheConfig};
use docview_cache::DocumentCache;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "docview_cache=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = CacheConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        CacheConfig::default()
    });
    let cleanup_interval = config::parse_var::<u64>("DOCVIEW_CACHE_CLEANUP_SECS")?
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CLEANUP_INTERVAL);

    tracing::info!("Starting Docview Cache v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Cache directory: {}", config.cache_dir.display());

    let cache = DocumentCache::new(config);

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if !paths.is_empty() {
        let scheduled = cache.preload_content(paths);
        cache.flush().await;
        let stats = cache.get_cache_stats().await;
        tracing::info!(
            scheduled = scheduled,
            cached = stats.content_entries,
            "Preload finished"
        );
    }

    let maintenance = cache.start_maintenance_task(cleanup_interval);
    tracing::info!(interval_secs = cleanup_interval.as_secs(), "Maintenance task running");

    shutdown_signal().await;

    maintenance.abort();
    cache.flush().await;

    let stats = cache.get_cache_stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
