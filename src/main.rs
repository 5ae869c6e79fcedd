//! Catalog Sync Dispatcher service

use anyhow::Result;
use catalog_sync::api::{self, AppState};
use catalog_sync::config::Config;
use catalog_sync::queue::{JobQueue, LocalQueue, NatsQueue};
use catalog_sync::shopify::ShopifyClientFactory;
use catalog_sync::store::PgStore;
use catalog_sync::worker::Worker;
use catalog_sync::{DispatchGate, SyncContext};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    let db = PgPoolOptions::new().max_connections(config.database_max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let store = Arc::new(PgStore::new(db));
    let clients = Arc::new(ShopifyClientFactory::new(reqwest::Client::new(), &config.shopify_api_version, &config.media_base_url));
    let settings = config.sync_settings();
    let worker = Arc::new(Worker::new(SyncContext::new(store.clone(), clients, settings), config.retry_policy()));

    let queue: Arc<dyn JobQueue> = match &config.nats_url {
        Some(url) => {
            let queue = NatsQueue::connect(async_nats::connect(url).await?).await?;
            let consumer = queue.consumer().await?;
            tokio::spawn(async move {
                if let Err(e) = worker.run_jetstream(consumer).await {
                    tracing::error!(error = %e, "catalog sync worker stopped");
                }
            });
            tracing::info!(%url, "catalog sync jobs queued on JetStream");
            Arc::new(queue)
        }
        None => {
            let (queue, rx) = LocalQueue::new();
            tokio::spawn(worker.run_local(queue.clone(), rx));
            tracing::info!("catalog sync jobs queued in-process");
            Arc::new(queue)
        }
    };

    if !settings.catalog_sync_enabled {
        tracing::warn!("catalog sync disabled, events will be accepted and ignored");
    }
    let state = AppState { store, gate: Arc::new(DispatchGate::new(queue, settings)) };
    let app = api::router(state).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    tracing::info!("Catalog sync listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
