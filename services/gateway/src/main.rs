mod config;
mod error;
mod handlers;
mod router;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use ingest::pg::{ChannelConfig, PgSource};
use ingest::pipeline::Pipeline;
use persistence::cache::OrderCache;
use persistence::pg::PgOrderStore;
use persistence::recovery;

use config::Config;
use router::create_router;
use state::AppState;

/// How long in-flight work may keep running after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting order service");
    let config = Config::from_env();

    // Durable store first: without it there is nothing to serve.
    let store = Arc::new(
        PgOrderStore::connect(&config.store_dsn)
            .await
            .context("store init")?,
    );

    // Rehydrate the cache before the pipeline or HTTP accept traffic.
    let cache = Arc::new(OrderCache::new());
    recovery::rehydrate(store.as_ref(), &cache)
        .await
        .context("cache rehydration")?;

    let mut channel_config = ChannelConfig::new(
        &config.channel_url,
        &config.channel,
        &config.durable_name,
    );
    channel_config.client_id = config.client_id.clone();
    let source = PgSource::connect(channel_config)
        .await
        .context("channel subscribe")?;
    tracing::info!(
        cluster = %config.cluster_id,
        client = %config.client_id,
        channel = %config.channel,
        durable = %config.durable_name,
        "consuming order channel"
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let pipeline = Pipeline::new(source, Arc::clone(&store), Arc::clone(&cache));
    let mut pipeline_task = tokio::spawn(pipeline.run(shutdown_tx.subscribe()));

    let app = create_router(AppState::new(Arc::clone(&cache)));
    let listener = TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("bind {}", config.http_addr))?;
    tracing::info!(addr = %config.http_addr, "Listening");

    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(());
        });
    }

    let mut http_shutdown = shutdown_tx.subscribe();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = http_shutdown.recv().await;
        })
        .await
        .context("http server")?;

    // Give the in-flight message a bounded grace period; past that the
    // pipeline is abandoned and an unacknowledged message will simply
    // be redelivered on the next run.
    if tokio::time::timeout(SHUTDOWN_GRACE, &mut pipeline_task)
        .await
        .is_err()
    {
        tracing::warn!("ingestion pipeline did not stop in time, aborting");
        pipeline_task.abort();
    }

    store.close();
    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
