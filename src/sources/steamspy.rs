/// SteamSpy API source
///
/// Serves the candidate lists (genre, all-time, trending) and per-title
/// community records (genre string + tag votes). SteamSpy's wire format is
/// dirty: owner counts are range strings, prices are minor-unit strings,
/// and missing tags serialize as an empty array. Everything funnels through
/// the normalizer and degrades to empty on failure.
use reqwest::Client as HttpClient;
use std::collections::HashMap;
use std::time::Duration;

use crate::{
    cached,
    db::{Cache, CacheKey},
    models::{CandidateGame, CommunityRecord, PoolSource},
    services::normalize::{normalize_spy_record, parse_tag_votes, split_genre_csv, RawSpyRecord},
    sources::CommunitySource,
};

const LIST_CACHE_TTL: u64 = 86400; // 24 hours
const APP_RECORD_CACHE_TTL: u64 = 86400; // 24 hours
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SteamSpyApi {
    http_client: HttpClient,
    api_url: String,
    cache: Cache,
}

impl SteamSpyApi {
    pub fn new(cache: Cache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_url,
            cache,
        }
    }

    /// Fetches a list endpoint and normalizes every record. Any failure,
    /// including a non-2xx status or an unparsable body, yields an empty
    /// list so one bad source never aborts pool assembly.
    async fn fetch_list(&self, query: &[(&str, &str)], source: PoolSource) -> Vec<CandidateGame> {
        let response = match self.http_client.get(&self.api_url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "SteamSpy list request failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(source = %source, status = %response.status(), "SteamSpy list request rejected");
            return Vec::new();
        }

        let records: HashMap<String, RawSpyRecord> = match response.json().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "SteamSpy list body unparsable");
                return Vec::new();
            }
        };

        let games: Vec<CandidateGame> = records
            .values()
            .map(|raw| normalize_spy_record(raw, source))
            .collect();

        tracing::info!(count = games.len(), source = %source, "SteamSpy list fetched");
        games
    }
}

#[async_trait::async_trait]
impl CommunitySource for SteamSpyApi {
    async fn games_by_genre(&self, genre: &str) -> Vec<CandidateGame> {
        let key = CacheKey::GenrePool(genre.to_string());
        cached!(self.cache, key, LIST_CACHE_TTL, async {
            self.fetch_list(
                &[("request", "genre"), ("genre", genre)],
                PoolSource::GenreMatched,
            )
            .await
        })
    }

    async fn top_all_time(&self) -> Vec<CandidateGame> {
        cached!(self.cache, CacheKey::TopAllTime, LIST_CACHE_TTL, async {
            self.fetch_list(&[("request", "top100forever")], PoolSource::AllTimePopular)
                .await
        })
    }

    async fn top_recent(&self) -> Vec<CandidateGame> {
        cached!(self.cache, CacheKey::TopRecent, LIST_CACHE_TTL, async {
            self.fetch_list(&[("request", "top100in2weeks")], PoolSource::Trending)
                .await
        })
    }

    async fn app_record(&self, appid: u32) -> Option<CommunityRecord> {
        let key = CacheKey::AppRecord(appid);
        if let Some(cached) = self.cache.get_from_cache::<CommunityRecord>(&key).await {
            return Some(cached);
        }

        let appid_param = appid.to_string();
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("request", "appdetails"), ("appid", appid_param.as_str())])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let raw: RawSpyRecord = response.json().await.ok()?;
        let record = CommunityRecord {
            genres: raw.genre.as_deref().map(split_genre_csv).unwrap_or_default(),
            tag_votes: parse_tag_votes(raw.tags.as_ref()),
        };

        self.cache.set_in_background(&key, &record, APP_RECORD_CACHE_TTL);
        Some(record)
    }
}
