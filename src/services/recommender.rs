use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    db::{Cache, CacheKey},
    error::AppResult,
    models::{PoolSource, ScoredCandidate, TasteProfile},
    services::{
        enrich::{collect_tag_votes, Enricher},
        gapfill::GapFiller,
        pool::PoolAssembler,
        profile::build_taste_profile,
        scoring::{rank_candidates, RankOptions},
    },
    sources::{CatalogSource, CommunitySource, LibrarySource},
};

/// Wall-clock budget for one full profile rebuild, including tag collection.
const TOTAL_BUDGET: Duration = Duration::from_millis(9000);
/// Share of the total budget reserved for owned-library enrichment.
const ENRICH_BUDGET: Duration = Duration::from_millis(7500);
/// Headroom kept at the end of the total budget so profile assembly and the
/// cache write happen inside it.
const TAG_DEADLINE_GUARD: Duration = Duration::from_millis(500);

/// Tag votes are only collected for this many top-playtime titles; the rest
/// of the library contributes genre signal but not tag signal.
const TAG_SLICE_SIZE: usize = 20;

const PROFILE_CACHE_TTL: u64 = 3600; // 1 hour

/// Result of a recommendation request.
///
/// "No signal" is a legitimate outcome for an empty or all-unplayed library,
/// reported as data rather than as an error so clients can render it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    NoSignal { total_games: usize },
    Ranked { recommendations: Vec<ScoredCandidate> },
}

/// Orchestrates the pipeline end to end: owned library, enrichment, profile,
/// candidate pool, gap fill, scoring.
pub struct RecommendationService {
    cache: Cache,
    library: Arc<dyn LibrarySource>,
    catalog: Arc<dyn CatalogSource>,
    community: Arc<dyn CommunitySource>,
}

impl RecommendationService {
    pub fn new(
        cache: Cache,
        library: Arc<dyn LibrarySource>,
        catalog: Arc<dyn CatalogSource>,
        community: Arc<dyn CommunitySource>,
    ) -> Self {
        Self {
            cache,
            library,
            catalog,
            community,
        }
    }

    /// Rebuilds the user's taste profile from scratch under the total
    /// budget, supersedes the cached snapshot, and returns the new one.
    ///
    /// Enrichment gets most of the budget; whatever remains (minus a small
    /// guard) goes to community tag collection. Titles the budget did not
    /// reach are logged as pending and picked up by the next rebuild, when
    /// their catalog metadata is already cached.
    pub async fn refresh_profile(&self, steam_id: &str) -> AppResult<TasteProfile> {
        let started = Instant::now();
        let games = self.library.owned_games(steam_id).await?;
        let total_games = games.len();

        let enricher = Enricher::new(Arc::clone(&self.catalog));
        let outcome = enricher.enrich_owned_games(games, ENRICH_BUDGET).await;

        // Enrichment returns titles in descending playtime order, so the tag
        // slice is simply the head of the list.
        let tag_slice: Vec<u32> = outcome
            .enriched
            .iter()
            .take(TAG_SLICE_SIZE)
            .map(|g| g.game.appid)
            .collect();
        let tag_deadline = started + TOTAL_BUDGET - TAG_DEADLINE_GUARD;
        let tag_votes = collect_tag_votes(&self.community, &tag_slice, tag_deadline).await;

        let profile = build_taste_profile(&outcome.enriched, &tag_votes);

        self.cache.set_in_background(
            &CacheKey::Profile(steam_id.to_string()),
            &profile,
            PROFILE_CACHE_TTL,
        );

        tracing::info!(
            steam_id,
            total_games,
            enriched = outcome.enriched.len(),
            pending = outcome.pending_app_ids.len(),
            top_genres = ?profile.top_genres,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Taste profile rebuilt"
        );

        Ok(profile)
    }

    /// Returns the cached profile snapshot, building one if none exists.
    pub async fn get_or_build_profile(&self, steam_id: &str) -> AppResult<TasteProfile> {
        let key = CacheKey::Profile(steam_id.to_string());
        if let Some(profile) = self.cache.get_from_cache::<TasteProfile>(&key).await {
            tracing::debug!(steam_id, "Profile served from cache");
            return Ok(profile);
        }
        self.refresh_profile(steam_id).await
    }

    /// Produces the ranked recommendation list for one user.
    pub async fn recommend(
        &self,
        steam_id: &str,
        sources: &[PoolSource],
        options: &RankOptions,
    ) -> AppResult<RecommendationOutcome> {
        let profile = self.get_or_build_profile(steam_id).await?;

        if !profile.has_signal() {
            tracing::info!(steam_id, total_games = profile.total_games, "No taste signal");
            return Ok(RecommendationOutcome::NoSignal {
                total_games: profile.total_games,
            });
        }

        let assembler =
            PoolAssembler::new(Arc::clone(&self.community), Arc::clone(&self.catalog));
        let pool = assembler.assemble(&profile.top_genres, sources).await;

        let filler = GapFiller::new(self.cache.clone(), Arc::clone(&self.community));
        let pool = filler.fill_missing(pool).await;

        // The library call is served from its own cache after the profile
        // build, so this does not cost a second upstream round trip.
        let owned_ids: HashSet<u32> = self
            .library
            .owned_games(steam_id)
            .await?
            .into_iter()
            .map(|g| g.appid)
            .collect();

        let ranked = rank_candidates(&profile, &pool, &owned_ids, options);

        tracing::info!(
            steam_id,
            pool_size = pool.len(),
            returned = ranked.len(),
            "Recommendations ranked"
        );

        Ok(RecommendationOutcome::Ranked {
            recommendations: ranked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateGame, Genre, OwnedGame};
    use crate::sources::{MockCatalogSource, MockCommunitySource, MockLibrarySource};
    use crate::{error::AppError, models::AppDetails};

    fn owned(appid: u32, playtime_forever: u64, playtime_2weeks: Option<u64>) -> OwnedGame {
        OwnedGame {
            appid,
            name: format!("game-{}", appid),
            playtime_forever,
            playtime_2weeks,
        }
    }

    fn action_details() -> AppDetails {
        AppDetails {
            name: "test".to_string(),
            is_free: false,
            genres: vec![Genre {
                id: "1".to_string(),
                description: "Action".to_string(),
            }],
            categories: vec![],
            price_overview: None,
        }
    }

    fn action_candidate(appid: u32) -> CandidateGame {
        CandidateGame {
            appid,
            name: format!("candidate-{}", appid),
            owners: 1_000_000,
            players_2weeks: 10_000,
            price: 15,
            positive: 900,
            negative: 100,
            genres: vec!["Action".to_string()],
            tags: vec![],
            categories: vec![],
            source: PoolSource::GenreMatched,
        }
    }

    fn service(
        library: MockLibrarySource,
        catalog: MockCatalogSource,
        community: MockCommunitySource,
    ) -> RecommendationService {
        RecommendationService::new(
            Cache::disabled(),
            Arc::new(library),
            Arc::new(catalog),
            Arc::new(community),
        )
    }

    #[tokio::test]
    async fn test_empty_library_yields_no_signal() {
        let mut library = MockLibrarySource::new();
        library.expect_owned_games().returning(|_| Ok(vec![]));

        let service = service(library, MockCatalogSource::new(), MockCommunitySource::new());
        let outcome = service
            .recommend("7656", &PoolSource::DEFAULT, &RankOptions::default())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            RecommendationOutcome::NoSignal { total_games: 0 }
        ));
    }

    #[tokio::test]
    async fn test_library_error_propagates() {
        let mut library = MockLibrarySource::new();
        library
            .expect_owned_games()
            .returning(|_| Err(AppError::ExternalApi("steam rejected".to_string())));

        let service = service(library, MockCatalogSource::new(), MockCommunitySource::new());
        let result = service.refresh_profile("7656").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_end_to_end_ranked_recommendations() {
        let mut library = MockLibrarySource::new();
        library
            .expect_owned_games()
            .returning(|_| Ok(vec![owned(10, 6000, Some(300))]));

        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_app_details()
            .returning(|_| Some(action_details()));
        catalog.expect_new_releases().returning(Vec::new);

        let mut community = MockCommunitySource::new();
        community
            .expect_app_record()
            .returning(|_| None);
        community
            .expect_games_by_genre()
            .returning(|_| vec![action_candidate(100), action_candidate(101)]);
        community.expect_top_all_time().returning(Vec::new);
        community.expect_top_recent().returning(Vec::new);

        let service = service(library, catalog, community);
        let outcome = service
            .recommend("7656", &PoolSource::DEFAULT, &RankOptions::default())
            .await
            .unwrap();

        let RecommendationOutcome::Ranked { recommendations } = outcome else {
            panic!("expected ranked outcome");
        };
        assert_eq!(recommendations.len(), 2);
        assert!(recommendations[0].breakdown.genre_match > 0.0);
    }

    #[tokio::test]
    async fn test_owned_titles_never_recommended() {
        let mut library = MockLibrarySource::new();
        library
            .expect_owned_games()
            .returning(|_| Ok(vec![owned(100, 6000, None)]));

        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_app_details()
            .returning(|_| Some(action_details()));
        catalog.expect_new_releases().returning(Vec::new);

        let mut community = MockCommunitySource::new();
        community.expect_app_record().returning(|_| None);
        community
            .expect_games_by_genre()
            .returning(|_| vec![action_candidate(100), action_candidate(200)]);
        community.expect_top_all_time().returning(Vec::new);
        community.expect_top_recent().returning(Vec::new);

        let service = service(library, catalog, community);
        let outcome = service
            .recommend("7656", &PoolSource::DEFAULT, &RankOptions::default())
            .await
            .unwrap();

        let RecommendationOutcome::Ranked { recommendations } = outcome else {
            panic!("expected ranked outcome");
        };
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].game.appid, 200);
    }

    #[tokio::test]
    async fn test_refresh_builds_profile_from_library() {
        let mut library = MockLibrarySource::new();
        library
            .expect_owned_games()
            .returning(|_| Ok(vec![owned(10, 6000, Some(300)), owned(11, 50, None)]));

        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_app_details()
            .returning(|_| Some(action_details()));

        let mut community = MockCommunitySource::new();
        community.expect_app_record().returning(|_| None);

        let service = service(library, catalog, community);
        let profile = service.refresh_profile("7656").await.unwrap();

        assert_eq!(profile.total_games, 2);
        assert_eq!(profile.top_genres, vec!["Action"]);
        assert!(profile.has_signal());
    }
}
