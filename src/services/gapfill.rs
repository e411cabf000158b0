use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    db::{Cache, CacheKey},
    models::{AppDetails, CandidateGame},
    sources::CommunitySource,
};

/// Resolved metadata for one candidate, from whichever rung of the fallback
/// chain answered first.
#[derive(Debug, Clone)]
struct GapFillData {
    genres: Vec<String>,
    tags: Vec<String>,
    categories: Vec<u32>,
}

/// Best-effort completion of candidates that arrived without genre data
/// (typically new-release and on-sale entries, which never carry any).
///
/// Resolution chain per candidate: the long-TTL catalog-metadata cache
/// first (already populated by owned-library enrichment), then a secondary
/// per-title community lookup. Candidates that already carry genres pass
/// through untouched, and a failed resolution leaves the candidate empty
/// but still scoreable.
pub struct GapFiller {
    cache: Cache,
    community: Arc<dyn CommunitySource>,
}

impl GapFiller {
    pub fn new(cache: Cache, community: Arc<dyn CommunitySource>) -> Self {
        Self { cache, community }
    }

    pub async fn fill_missing(&self, mut candidates: Vec<CandidateGame>) -> Vec<CandidateGame> {
        // An empty genre list is the resolution trigger, matching how the
        // upstream feeds mark "unknown".
        let missing: Vec<u32> = candidates
            .iter()
            .filter(|c| c.genres.is_empty())
            .map(|c| c.appid)
            .collect();

        if missing.is_empty() {
            return candidates;
        }

        // Per-candidate resolutions are independent; fan out and aggregate
        // by app id so completion order cannot matter.
        let mut tasks = Vec::with_capacity(missing.len());
        for appid in missing {
            let cache = self.cache.clone();
            let community = Arc::clone(&self.community);
            tasks.push(tokio::spawn(async move {
                (appid, resolve_one(cache, community, appid).await)
            }));
        }

        let mut resolved: HashMap<u32, GapFillData> = HashMap::new();
        for task in tasks {
            match task.await {
                Ok((appid, Some(data))) => {
                    resolved.insert(appid, data);
                }
                Ok((_, None)) => {}
                Err(e) => tracing::error!(error = %e, "Gap fill task join error"),
            }
        }

        let mut filled = 0;
        for candidate in &mut candidates {
            if !candidate.genres.is_empty() {
                continue;
            }
            if let Some(data) = resolved.get(&candidate.appid) {
                candidate.genres = data.genres.clone();
                if candidate.tags.is_empty() {
                    candidate.tags = data.tags.clone();
                }
                if candidate.categories.is_empty() {
                    candidate.categories = data.categories.clone();
                }
                filled += 1;
            }
        }

        tracing::info!(filled, "Candidate gap fill completed");
        candidates
    }
}

async fn resolve_one(
    cache: Cache,
    community: Arc<dyn CommunitySource>,
    appid: u32,
) -> Option<GapFillData> {
    // Cache-first: catalog metadata written during enrichment has a 7-day
    // TTL, so owned-adjacent titles usually resolve without a fetch.
    if let Some(details) = cache
        .get_from_cache::<AppDetails>(&CacheKey::AppDetails(appid))
        .await
    {
        if !details.genres.is_empty() {
            return Some(GapFillData {
                genres: details
                    .genres
                    .iter()
                    .map(|g| g.description.clone())
                    .collect(),
                tags: Vec::new(),
                categories: details.category_ids(),
            });
        }
    }

    // Fall through to the secondary per-title lookup.
    let record = community.app_record(appid).await?;
    if record.genres.is_empty() && record.tag_votes.is_empty() {
        return None;
    }
    Some(GapFillData {
        tags: record.tags_by_votes(),
        genres: record.genres,
        categories: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommunityRecord, PoolSource};
    use crate::sources::MockCommunitySource;

    fn candidate(appid: u32, genres: &[&str]) -> CandidateGame {
        CandidateGame {
            appid,
            name: format!("game-{}", appid),
            owners: 0,
            players_2weeks: 0,
            price: 0,
            positive: 0,
            negative: 0,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            tags: vec![],
            categories: vec![],
            source: PoolSource::NewRelease,
        }
    }

    #[tokio::test]
    async fn test_populated_candidates_pass_through_untouched() {
        // The community mock would panic on any lookup; nothing is missing.
        let filler = GapFiller::new(Cache::disabled(), Arc::new(MockCommunitySource::new()));
        let input = vec![candidate(1, &["Action"]), candidate(2, &["RPG"])];

        let output = filler.fill_missing(input.clone()).await;
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_missing_genres_filled_from_community_lookup() {
        let mut community = MockCommunitySource::new();
        community.expect_app_record().returning(|_| {
            Some(CommunityRecord {
                genres: vec!["Strategy".to_string()],
                tag_votes: HashMap::from([("Turn-Based".to_string(), 50_u64)]),
            })
        });

        let filler = GapFiller::new(Cache::disabled(), Arc::new(community));
        let output = filler.fill_missing(vec![candidate(1, &[])]).await;

        assert_eq!(output[0].genres, vec!["Strategy"]);
        assert_eq!(output[0].tags, vec!["Turn-Based"]);
    }

    #[tokio::test]
    async fn test_failed_resolution_leaves_candidate_scoreable() {
        let mut community = MockCommunitySource::new();
        community.expect_app_record().returning(|_| None);

        let filler = GapFiller::new(Cache::disabled(), Arc::new(community));
        let output = filler.fill_missing(vec![candidate(1, &[])]).await;

        assert_eq!(output.len(), 1);
        assert!(output[0].genres.is_empty());
    }

    #[tokio::test]
    async fn test_only_missing_candidates_are_looked_up() {
        let mut community = MockCommunitySource::new();
        // Exactly one lookup expected, for the one candidate missing genres
        community
            .expect_app_record()
            .times(1)
            .returning(|_| {
                Some(CommunityRecord {
                    genres: vec!["Indie".to_string()],
                    tag_votes: HashMap::new(),
                })
            });

        let filler = GapFiller::new(Cache::disabled(), Arc::new(community));
        let output = filler
            .fill_missing(vec![candidate(1, &["Action"]), candidate(2, &[])])
            .await;

        assert_eq!(output[0].genres, vec!["Action"]);
        assert_eq!(output[1].genres, vec!["Indie"]);
    }
}
