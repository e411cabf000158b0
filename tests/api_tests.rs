use std::collections::HashMap;
use std::sync::Arc;

use axum_test::TestServer;

use backlog_api::api::{create_router, AppState};
use backlog_api::db::Cache;
use backlog_api::error::{AppError, AppResult};
use backlog_api::models::{
    AppDetails, CandidateGame, CommunityRecord, Genre, OwnedGame, PoolSource,
};
use backlog_api::services::RecommendationService;
use backlog_api::sources::{CatalogSource, CommunitySource, LibrarySource};

// Stub sources with fixed responses. Integration tests exercise the real
// router, state, and pipeline; only the upstream HTTP calls are stubbed out.

struct StubLibrary {
    games: AppResult<Vec<OwnedGame>>,
}

#[async_trait::async_trait]
impl LibrarySource for StubLibrary {
    async fn owned_games(&self, _steam_id: &str) -> AppResult<Vec<OwnedGame>> {
        match &self.games {
            Ok(games) => Ok(games.clone()),
            Err(_) => Err(AppError::ExternalApi("stubbed upstream failure".to_string())),
        }
    }
}

struct StubCatalog {
    genre: Option<String>,
}

#[async_trait::async_trait]
impl CatalogSource for StubCatalog {
    async fn app_details(&self, _appid: u32) -> Option<AppDetails> {
        let genre = self.genre.clone()?;
        Some(AppDetails {
            name: "owned title".to_string(),
            is_free: false,
            genres: vec![Genre {
                id: "1".to_string(),
                description: genre,
            }],
            categories: vec![],
            price_overview: None,
        })
    }

    async fn new_releases(&self) -> Vec<CandidateGame> {
        vec![]
    }

    async fn specials(&self) -> Vec<CandidateGame> {
        vec![]
    }
}

struct StubCommunity {
    genre_pool: Vec<CandidateGame>,
}

#[async_trait::async_trait]
impl CommunitySource for StubCommunity {
    async fn games_by_genre(&self, _genre: &str) -> Vec<CandidateGame> {
        self.genre_pool.clone()
    }

    async fn top_all_time(&self) -> Vec<CandidateGame> {
        vec![]
    }

    async fn top_recent(&self) -> Vec<CandidateGame> {
        vec![]
    }

    async fn app_record(&self, _appid: u32) -> Option<CommunityRecord> {
        Some(CommunityRecord {
            genres: vec!["Action".to_string()],
            tag_votes: HashMap::from([("Roguelike".to_string(), 100_u64)]),
        })
    }
}

fn owned(appid: u32, playtime_forever: u64, playtime_2weeks: Option<u64>) -> OwnedGame {
    OwnedGame {
        appid,
        name: format!("owned-{}", appid),
        playtime_forever,
        playtime_2weeks,
    }
}

fn candidate(appid: u32, price: u64) -> CandidateGame {
    CandidateGame {
        appid,
        name: format!("candidate-{}", appid),
        owners: 2_000_000,
        players_2weeks: 50_000,
        price,
        positive: 9_000,
        negative: 1_000,
        genres: vec!["Action".to_string()],
        tags: vec![],
        categories: vec![],
        source: PoolSource::GenreMatched,
    }
}

fn create_test_server(
    library: StubLibrary,
    catalog: StubCatalog,
    community: StubCommunity,
) -> TestServer {
    let recommender = RecommendationService::new(
        Cache::disabled(),
        Arc::new(library),
        Arc::new(catalog),
        Arc::new(community),
    );
    let app = create_router(AppState::new(Arc::new(recommender)));
    TestServer::new(app).unwrap()
}

fn server_with_library() -> TestServer {
    create_test_server(
        StubLibrary {
            games: Ok(vec![owned(10, 6000, Some(300)), owned(11, 1200, None)]),
        },
        StubCatalog {
            genre: Some("Action".to_string()),
        },
        StubCommunity {
            genre_pool: vec![candidate(100, 15), candidate(10, 15), candidate(101, 5000)],
        },
    )
}

#[tokio::test]
async fn test_health_check() {
    let server = server_with_library();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_profile_built_from_owned_library() {
    let server = server_with_library();

    let response = server.get("/api/v1/profile/76561198000000001").await;
    response.assert_status_ok();

    let profile: serde_json::Value = response.json();
    assert_eq!(profile["total_games"], 2);
    assert_eq!(profile["top_genres"][0], "Action");
    assert!(profile["genre_scores"]["Action"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_profile_refresh_returns_fresh_snapshot() {
    let server = server_with_library();

    let response = server
        .post("/api/v1/profile/76561198000000001/refresh")
        .await;
    response.assert_status_ok();

    let profile: serde_json::Value = response.json();
    assert_eq!(profile["top_genres"][0], "Action");
}

#[tokio::test]
async fn test_recommendations_ranked_and_exclude_owned() {
    let server = server_with_library();

    let response = server.get("/api/v1/recommendations/76561198000000001").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ranked");

    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 2);
    // App 10 is owned and must not come back
    assert!(recommendations.iter().all(|r| r["appid"] != 10));
    // Descending by score
    let scores: Vec<u64> = recommendations
        .iter()
        .map(|r| r["score"].as_u64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_recommendations_respect_max_price() {
    let server = server_with_library();

    let response = server
        .get("/api/v1/recommendations/76561198000000001")
        .add_query_param("max_price", "100")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let recommendations = body["recommendations"].as_array().unwrap();
    // The 5000-unit candidate is filtered out
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0]["appid"], 100);
}

#[tokio::test]
async fn test_recommendations_invalid_source_is_bad_request() {
    let server = server_with_library();

    let response = server
        .get("/api/v1/recommendations/76561198000000001")
        .add_query_param("sources", "weekly_deals")
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_library_yields_no_signal_payload() {
    let server = create_test_server(
        StubLibrary { games: Ok(vec![]) },
        StubCatalog { genre: None },
        StubCommunity { genre_pool: vec![] },
    );

    let response = server.get("/api/v1/recommendations/76561198000000001").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "no_signal");
    assert_eq!(body["total_games"], 0);
}

#[tokio::test]
async fn test_library_failure_is_bad_gateway() {
    let server = create_test_server(
        StubLibrary {
            games: Err(AppError::ExternalApi("down".to_string())),
        },
        StubCatalog { genre: None },
        StubCommunity { genre_pool: vec![] },
    );

    let response = server.get("/api/v1/profile/76561198000000001").await;
    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
}
