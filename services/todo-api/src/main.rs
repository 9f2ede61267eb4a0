//! Todo API entry point.

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use todo_api::jwt::{CachedKeySetFetcher, HttpKeySetFetcher, KeySetFetcher, TokenValidator};
use todo_api::observability::{init_tracing, LogFormat};
use todo_api::shutdown::{run_with_drain_timeout, wait_for_signal};
use todo_api::config::StoreBackend;
use todo_api::store::{DynamoTodoStore, MemoryTodoStore, TimeoutStore, TodoStore};
use todo_api::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LogFormat::Json);
    init_tracing(log_format).context("Failed to initialise tracing")?;

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        listen_addr = %config.listen_addr(),
        table = %config.table_name,
        store_backend = ?config.store_backend,
        region = %config.region,
        jwks_url = %config.jwks_url_str(),
        "Starting todo API"
    );

    let http_fetcher = HttpKeySetFetcher::new(config.jwks_url_str(), config.jwks_timeout())
        .context("Failed to build JWKS client")?;
    let fetcher: Arc<dyn KeySetFetcher> = match config.jwks_cache_ttl() {
        Some(ttl) => Arc::new(CachedKeySetFetcher::new(http_fetcher, ttl)),
        None => Arc::new(http_fetcher),
    };
    let validator = Arc::new(TokenValidator::new(fetcher, config.client_id.clone()));

    let store: Arc<dyn TodoStore> = match config.store_backend {
        StoreBackend::DynamoDb => {
            let dynamo = DynamoTodoStore::from_env(
                config.region.clone(),
                config.table_name.clone(),
                config.dynamodb_endpoint.as_ref().map(url::Url::as_str),
            )
            .await;
            Arc::new(TimeoutStore::new(dynamo, config.store_timeout()))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; todos are lost on restart");
            Arc::new(TimeoutStore::new(
                MemoryTodoStore::new(config.table_name.clone()),
                config.store_timeout(),
            ))
        }
    };

    let app = build_router(AppState::new(validator, store));

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr()))?;
    info!(addr = %config.listen_addr(), "Listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_requested(shutdown_rx.clone()))
        .into_future();

    run_with_drain_timeout(
        server,
        shutdown_requested(shutdown_rx),
        config.shutdown_timeout(),
    )
    .await
    .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
