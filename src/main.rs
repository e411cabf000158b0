use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backlog_api::api::{create_router, AppState};
use backlog_api::config::Config;
use backlog_api::db::{create_redis_client, Cache};
use backlog_api::services::RecommendationService;
use backlog_api::sources::{SteamSpyApi, SteamStoreApi, SteamWebApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backlog_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Redis is optional: an empty url or an unparsable one degrades to the
    // no-caching mode and every request pays full upstream latency.
    let (cache, writer) = if config.redis_url.is_empty() {
        tracing::warn!("REDIS_URL is empty, caching disabled");
        (Cache::disabled(), None)
    } else {
        match create_redis_client(&config.redis_url) {
            Ok(client) => {
                let (cache, writer) = Cache::new(client);
                (cache, Some(writer))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Invalid REDIS_URL, caching disabled");
                (Cache::disabled(), None)
            }
        }
    };

    let library = Arc::new(SteamWebApi::new(
        cache.clone(),
        config.steam_api_key.clone(),
        config.steam_api_url.clone(),
    ));
    let catalog = Arc::new(SteamStoreApi::new(
        cache.clone(),
        config.store_api_url.clone(),
        config.locale.clone(),
        config.country_code.clone(),
    ));
    let community = Arc::new(SteamSpyApi::new(
        cache.clone(),
        config.steamspy_api_url.clone(),
    ));

    let recommender = Arc::new(RecommendationService::new(
        cache, library, catalog, community,
    ));
    let app = create_router(AppState::new(recommender));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    // Flush any queued cache writes before exiting.
    if let Some(writer) = writer {
        writer.shutdown().await;
    }

    Ok(())
}
