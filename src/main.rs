//! Orderflow service entry point
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Connect the storage engine and bootstrap its schema
//! 4. Warm the cache from storage
//! 5. Start the background TTL sweep task
//! 6. Start the ingestion workers
//! 7. Start the HTTP server
//! 8. Handle graceful shutdown on SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderflow::api::{create_router, AppState};
use orderflow::broker::{MemoryBroker, MessageSource};
use orderflow::cache::{shared, CacheStore};
use orderflow::config::Config;
use orderflow::pipeline::{spawn_workers, warm_cache};
use orderflow::service::OrderService;
use orderflow::storage::{OrderStore, PgOrderStore};
use orderflow::tasks::spawn_cleanup_task;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderflow=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting order ingestion service");

    let config = Config::from_env();
    info!(
        max_entries = config.cache_max_entries,
        ttl_secs = config.cache_ttl.as_secs(),
        workers = config.worker_count,
        topic = %config.kafka_topic,
        group_id = %config.kafka_group_id,
        brokers = %config.kafka_brokers,
        port = config.server_port,
        "Configuration loaded"
    );

    // Setup failures are fatal; everything after this point is handled
    // locally inside the worker loops.
    let store = PgOrderStore::connect(&config.database_url, config.db_max_connections)
        .await
        .context("failed to connect to postgres")?;
    store
        .init_schema()
        .await
        .context("failed to bootstrap schema")?;
    let store: Arc<dyn OrderStore> = Arc::new(store);
    info!("Storage engine connected");

    let cache = shared(CacheStore::new(
        config.cache_max_entries,
        config.cache_ttl.as_millis() as u64,
    ));

    let warmed = warm_cache(store.as_ref(), &cache)
        .await
        .context("cache warm-up failed")?;
    info!(orders = warmed, "Cache warm start complete");

    let cleanup_handle = spawn_cleanup_task(cache.clone(), config.cache_ttl);

    let broker = Arc::new(MemoryBroker::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handles = spawn_workers(
        config.worker_count,
        broker.clone() as Arc<dyn MessageSource>,
        store.clone(),
        cache.clone(),
        shutdown_rx,
        config.poll_timeout,
    );
    info!(workers = config.worker_count, "Ingestion workers started");

    let service = OrderService::new(cache.clone(), store);
    let app = create_router(AppState::new(service, cache, broker));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx, cleanup_handle))
        .await
        .context("server error")?;

    // Workers observe the stop flag on their next poll cycle; any
    // in-flight transaction finishes before the worker exits.
    for handle in worker_handles {
        let _ = handle.await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then signals the workers and aborts the
/// sweep task.
async fn shutdown_signal(
    shutdown_tx: watch::Sender<bool>,
    cleanup_handle: tokio::task::JoinHandle<()>,
) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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

    let _ = shutdown_tx.send(true);
    cleanup_handle.abort();
    warn!("Background sweep task stopped");
}
