use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use moodmix_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, Cache, RecommendationHistory},
    services::providers::web_api::WebCatalogProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moodmix_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let redis_client =
        create_redis_client(&config.redis_url).context("Failed to create Redis client")?;
    let (cache, cache_writer) = Cache::new(redis_client.clone());

    let catalog = Arc::new(WebCatalogProvider::new(
        cache,
        config.catalog_access_token.clone(),
        config.catalog_api_url.clone(),
    ));

    let history = config
        .history_enabled
        .then(|| RecommendationHistory::new(redis_client));

    tracing::info!(
        catalog_api_url = %config.catalog_api_url,
        history_enabled = history.is_some(),
        "Catalog provider configured"
    );

    let state = AppState::new(catalog, history, config.expansion_settings());
    let sweeper = state.spawn_session_sweeper();
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    cache_writer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
