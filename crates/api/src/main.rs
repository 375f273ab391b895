use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill_core::builtin;
use quill_core::catalog::Catalog;
use quill_engine::backend::GatewayBackend;
use quill_engine::render::BuiltinTemplates;
use quill_engine::{BatchAggregator, Dispatcher, Worker, WorkerPool};
use quill_store::MemoryStore;

use quill_api::config::ServerConfig;
use quill_api::router::build_app_router;
use quill_api::state::AppState;
use quill_api::background;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill_api=debug,quill_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Action catalog ---
    let catalog = Arc::new(Catalog::build(&builtin::definitions()));
    for skipped in catalog.skipped() {
        tracing::warn!(
            definition = %skipped.name,
            reason = %skipped.reason,
            "Skipped malformed action definition",
        );
    }
    tracing::info!(actions = catalog.len(), "Action catalog built");

    // --- Store ---
    let store = Arc::new(MemoryStore::new(Duration::from_secs(config.job_ttl_secs)));

    // --- Engine ---
    let backend = Arc::new(GatewayBackend::new(config.gateway_url.clone()));
    let worker = Arc::new(Worker::new(
        store.clone(),
        Arc::new(BuiltinTemplates),
        backend,
    ));

    let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
    let cancel = CancellationToken::new();
    let pool = WorkerPool::spawn(
        config.worker_concurrency,
        worker.clone(),
        queue_rx,
        cancel.clone(),
    );
    tracing::info!(workers = config.worker_concurrency, "Worker pool started");

    let aggregator = Arc::new(BatchAggregator::new(store.clone(), store.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        catalog.clone(),
        store.clone(),
        aggregator.clone(),
        queue_tx,
        worker,
        config.models.clone(),
    ));

    // --- Background retention sweep ---
    let retention_handle = tokio::spawn(background::store_retention::run(
        store.clone(),
        Duration::from_secs(config.sweep_interval_secs),
        cancel.clone(),
    ));

    // --- App state & router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        catalog,
        jobs: store,
        dispatcher,
        aggregator,
    };
    let app = build_app_router(state, &config);

    // --- Serve ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "Quill API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Stop background tasks and let in-flight work drain.
    cancel.cancel();
    pool.join().await;
    let _ = retention_handle.await;
    tracing::info!("Shutdown complete");
}

/// Resolve when SIGINT (or SIGTERM on Unix) is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
