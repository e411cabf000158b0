/// Steam Web API source
///
/// Serves the owned-library lookup. Unlike every other source, failures
/// here are fatal for the calling request: without the library there is
/// nothing to profile, and a missing API key is a deployment problem the
/// caller must see.
use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{OwnedGame, OwnedGamesResponse},
    sources::LibrarySource,
};

const OWNED_CACHE_TTL: u64 = 3600; // 1 hour
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SteamWebApi {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl SteamWebApi {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
            api_url,
            cache,
        }
    }
}

#[async_trait::async_trait]
impl LibrarySource for SteamWebApi {
    async fn owned_games(&self, steam_id: &str) -> AppResult<Vec<OwnedGame>> {
        if self.api_key.is_empty() {
            return Err(AppError::Config(
                "STEAM_API_KEY is not configured".to_string(),
            ));
        }

        let key = CacheKey::OwnedGames(steam_id.to_string());
        if let Some(cached) = self.cache.get_from_cache::<Vec<OwnedGame>>(&key).await {
            tracing::debug!(steam_id = %steam_id, games = cached.len(), "Owned library cache hit");
            return Ok(cached);
        }

        let url = format!("{}/IPlayerService/GetOwnedGames/v1/", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("steamid", steam_id),
                ("format", "json"),
                ("include_appinfo", "1"),
                ("include_played_free_games", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Steam API returned status {}",
                status
            )));
        }

        let data: OwnedGamesResponse = response.json().await?;
        let games = data.response.games;

        // An empty list is a real answer (private or empty profile); cache
        // it like any other so we do not hammer the API for such users.
        self.cache.set_in_background(&key, &games, OWNED_CACHE_TTL);

        tracing::info!(
            steam_id = %steam_id,
            games = games.len(),
            source = "steam",
            "Owned library fetched"
        );

        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let api = SteamWebApi::new(
            Cache::disabled(),
            String::new(),
            "http://test.local".to_string(),
        );

        let result = api.owned_games("76561198000000001").await;
        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("STEAM_API_KEY")),
            other => panic!("expected Config error, got {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_propagates_error() {
        // Port 1 refuses connections; the library source must surface the
        // failure rather than degrade to an empty library.
        let api = SteamWebApi::new(
            Cache::disabled(),
            "test_key".to_string(),
            "http://127.0.0.1:1".to_string(),
        );

        let result = api.owned_games("76561198000000001").await;
        assert!(matches!(result, Err(AppError::HttpClient(_))));
    }
}
