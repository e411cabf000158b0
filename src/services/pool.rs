use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    models::{CandidateGame, PoolSource},
    sources::{CatalogSource, CommunitySource},
};

/// Assembles the candidate pool from the enabled sources.
///
/// Sources are fetched concurrently and merged only after all of them
/// resolve, so a slow high-priority source still wins over a fast
/// low-priority one. A failing source contributes an empty list; partial
/// results always beat none.
pub struct PoolAssembler {
    community: Arc<dyn CommunitySource>,
    catalog: Arc<dyn CatalogSource>,
}

impl PoolAssembler {
    pub fn new(community: Arc<dyn CommunitySource>, catalog: Arc<dyn CatalogSource>) -> Self {
        Self { community, catalog }
    }

    /// Builds the deduplicated pool for the given top genres.
    ///
    /// Concatenation follows the fixed priority order (genre-matched,
    /// all-time-popular, trending, new-release, on-sale) and deduplication
    /// keeps the first occurrence, so genre relevance trumps generic
    /// popularity when a title appears in several sources.
    pub async fn assemble(
        &self,
        top_genres: &[String],
        enabled: &[PoolSource],
    ) -> Vec<CandidateGame> {
        let enabled: HashSet<PoolSource> = enabled.iter().copied().collect();

        let genre_fut = async {
            if !enabled.contains(&PoolSource::GenreMatched) {
                return Vec::new();
            }
            // Per-genre fetches fan out; aggregation stays in the caller's
            // genre order regardless of completion order.
            let mut tasks = Vec::new();
            for genre in top_genres {
                let community = Arc::clone(&self.community);
                let genre = genre.clone();
                tasks.push(tokio::spawn(
                    async move { community.games_by_genre(&genre).await },
                ));
            }

            let mut games = Vec::new();
            for task in tasks {
                match task.await {
                    Ok(list) => games.extend(list),
                    Err(e) => tracing::error!(error = %e, "Genre pool task join error"),
                }
            }
            games
        };

        let classic_fut = async {
            if enabled.contains(&PoolSource::AllTimePopular) {
                self.community.top_all_time().await
            } else {
                Vec::new()
            }
        };

        let trending_fut = async {
            if enabled.contains(&PoolSource::Trending) {
                self.community.top_recent().await
            } else {
                Vec::new()
            }
        };

        let new_fut = async {
            if enabled.contains(&PoolSource::NewRelease) {
                self.catalog.new_releases().await
            } else {
                Vec::new()
            }
        };

        let sale_fut = async {
            if enabled.contains(&PoolSource::OnSale) {
                self.catalog.specials().await
            } else {
                Vec::new()
            }
        };

        let (genre_games, classic, trending, new_releases, on_sale) =
            tokio::join!(genre_fut, classic_fut, trending_fut, new_fut, sale_fut);

        let mut seen: HashSet<u32> = HashSet::new();
        let mut pool = Vec::new();
        for game in genre_games
            .into_iter()
            .chain(classic)
            .chain(trending)
            .chain(new_releases)
            .chain(on_sale)
        {
            if seen.insert(game.appid) {
                pool.push(game);
            }
        }

        tracing::info!(
            pool_size = pool.len(),
            genres = top_genres.len(),
            sources = enabled.len(),
            "Candidate pool assembled"
        );

        pool
    }
}
