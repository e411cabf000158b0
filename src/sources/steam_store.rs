/// Steam Store API source
///
/// Serves per-title catalog metadata (genres, categories, price) and the
/// featured new-release/specials feeds. All lookups are best-effort: any
/// failure degrades to `None` or an empty list. Metadata is requested in
/// one fixed locale so cached entries stay comparable across sources.
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    cached,
    db::{Cache, CacheKey},
    models::{AppDetails, AppDetailsResponse, CandidateGame, PoolSource},
    services::normalize::{normalize_featured_item, RawFeaturedItem},
    sources::CatalogSource,
};

const DETAILS_CACHE_TTL: u64 = 604800; // 7 days; catalog metadata changes rarely
const NEW_RELEASES_CACHE_TTL: u64 = 21600; // 6 hours
const SPECIALS_CACHE_TTL: u64 = 3600; // 1 hour; sales churn quickly
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SteamStoreApi {
    http_client: HttpClient,
    api_url: String,
    locale: String,
    country_code: String,
    cache: Cache,
}

/// Wire shape of `/api/featuredcategories`
#[derive(Debug, Deserialize)]
struct FeaturedCategoriesResponse {
    #[serde(default)]
    new_releases: Option<FeaturedCategory>,
    #[serde(default)]
    specials: Option<FeaturedCategory>,
}

#[derive(Debug, Deserialize)]
struct FeaturedCategory {
    #[serde(default)]
    items: Vec<RawFeaturedItem>,
}

impl SteamStoreApi {
    pub fn new(cache: Cache, api_url: String, locale: String, country_code: String) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_url,
            locale,
            country_code,
            cache,
        }
    }

    async fn fetch_app_details(&self, appid: u32) -> Option<AppDetails> {
        let url = format!("{}/appdetails", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("appids", appid.to_string().as_str()),
                ("l", self.locale.as_str()),
                ("cc", self.country_code.as_str()),
            ])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!(appid, status = %response.status(), "App details request failed");
            return None;
        }

        let body: AppDetailsResponse = response.json().await.ok()?;
        let entry = body.get(&appid.to_string())?;
        if !entry.success {
            return None;
        }
        entry.data.clone()
    }

    async fn fetch_featured(&self) -> Option<FeaturedCategoriesResponse> {
        let url = format!("{}/featuredcategories", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("cc", self.country_code.as_str()),
                ("l", self.locale.as_str()),
            ])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Featured categories request failed");
            return None;
        }

        response.json().await.ok()
    }
}

#[async_trait::async_trait]
impl CatalogSource for SteamStoreApi {
    async fn app_details(&self, appid: u32) -> Option<AppDetails> {
        let key = CacheKey::AppDetails(appid);
        if let Some(cached) = self.cache.get_from_cache::<AppDetails>(&key).await {
            return Some(cached);
        }

        let details = self.fetch_app_details(appid).await;

        // Only positive results are cached; a transient failure should not
        // pin a miss for a week.
        if let Some(details) = &details {
            self.cache.set_in_background(&key, details, DETAILS_CACHE_TTL);
        }

        details
    }

    async fn new_releases(&self) -> Vec<CandidateGame> {
        cached!(self.cache, CacheKey::NewReleases, NEW_RELEASES_CACHE_TTL, async {
            let items = self
                .fetch_featured()
                .await
                .and_then(|f| f.new_releases)
                .map(|c| c.items)
                .unwrap_or_default();

            let games: Vec<CandidateGame> = items
                .iter()
                .map(|item| normalize_featured_item(item, PoolSource::NewRelease))
                .collect();

            tracing::info!(count = games.len(), source = "steam_store", "New releases fetched");
            games
        })
    }

    async fn specials(&self) -> Vec<CandidateGame> {
        cached!(self.cache, CacheKey::Specials, SPECIALS_CACHE_TTL, async {
            let items = self
                .fetch_featured()
                .await
                .and_then(|f| f.specials)
                .map(|c| c.items)
                .unwrap_or_default();

            let games: Vec<CandidateGame> = items
                .iter()
                .map(|item| normalize_featured_item(item, PoolSource::OnSale))
                .collect();

            tracing::info!(count = games.len(), source = "steam_store", "Specials fetched");
            games
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_api() -> SteamStoreApi {
        SteamStoreApi::new(
            Cache::disabled(),
            "http://127.0.0.1:1".to_string(),
            "english".to_string(),
            "us".to_string(),
        )
    }

    #[tokio::test]
    async fn test_app_details_failure_degrades_to_none() {
        let api = unreachable_api();
        assert_eq!(api.app_details(570).await, None);
    }

    #[tokio::test]
    async fn test_featured_feeds_degrade_to_empty() {
        let api = unreachable_api();
        assert!(api.new_releases().await.is_empty());
        assert!(api.specials().await.is_empty());
    }

    #[test]
    fn test_featured_response_parses_both_slots() {
        let json = r#"{
            "new_releases": {"items": [{"id": 10, "name": "Fresh", "final_price": 1999}]},
            "specials": {"items": [{"id": 20, "name": "Bargain", "final_price": 499}]}
        }"#;
        let parsed: FeaturedCategoriesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.new_releases.unwrap().items[0].id, 10);
        assert_eq!(parsed.specials.unwrap().items[0].id, 20);
    }
}
