use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    models::{EnrichedGame, OwnedGame},
    sources::{CatalogSource, CommunitySource, TagVotes},
};

/// Concurrent catalog lookups per batch
const ENRICH_BATCH_SIZE: usize = 10;
/// Concurrent tag lookups per batch
const TAG_BATCH_SIZE: usize = 5;
/// Courtesy pause between batches. Simple rate control toward upstream,
/// not a precise one.
const INTER_BATCH_DELAY: Duration = Duration::from_millis(100);

/// Result of a time-budgeted enrichment pass.
pub struct EnrichmentOutcome {
    /// Titles whose catalog lookup completed (successfully or not)
    pub enriched: Vec<EnrichedGame>,
    /// Titles not reached before the budget expired; eligible for a later
    /// incremental pass, never silently dropped
    pub pending_app_ids: Vec<u32>,
}

/// Attaches catalog metadata to owned titles under a wall-clock budget.
///
/// The enrichment source may be slow or rate-limited and the caller is an
/// interactive request, so this is strictly time-boxed. Titles are processed
/// in batches of [`ENRICH_BATCH_SIZE`] ordered by descending playtime (the
/// titles that shape the profile most get first claim on the budget). The
/// deadline is one shared monotonic instant checked before each batch; work
/// in flight when it passes is awaited, but no new batch starts.
pub struct Enricher {
    catalog: Arc<dyn CatalogSource>,
}

impl Enricher {
    pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }

    pub async fn enrich_owned_games(
        &self,
        games: Vec<OwnedGame>,
        budget: Duration,
    ) -> EnrichmentOutcome {
        let deadline = Instant::now() + budget;

        let mut sorted = games;
        sorted.sort_by(|a, b| b.playtime_forever.cmp(&a.playtime_forever));

        let mut enriched = Vec::with_capacity(sorted.len());
        let mut pending_app_ids = Vec::new();
        let total_batches = sorted.len().div_ceil(ENRICH_BATCH_SIZE);

        for (batch_index, batch) in sorted.chunks(ENRICH_BATCH_SIZE).enumerate() {
            if Instant::now() >= deadline {
                pending_app_ids.extend(batch.iter().map(|g| g.appid));
                continue;
            }

            let mut tasks = Vec::with_capacity(batch.len());
            for game in batch {
                let catalog = Arc::clone(&self.catalog);
                let game = game.clone();
                tasks.push(tokio::spawn(async move {
                    let details = catalog.app_details(game.appid).await;
                    EnrichedGame::new(game, details)
                }));
            }

            for (task, game) in tasks.into_iter().zip(batch) {
                match task.await {
                    Ok(result) => enriched.push(result),
                    Err(e) => {
                        tracing::error!(appid = game.appid, error = %e, "Enrichment task join error");
                        enriched.push(EnrichedGame::new(game.clone(), None));
                    }
                }
            }

            if batch_index + 1 < total_batches {
                tokio::time::sleep(INTER_BATCH_DELAY).await;
            }
        }

        tracing::info!(
            enriched = enriched.len(),
            pending = pending_app_ids.len(),
            "Owned-library enrichment finished"
        );

        EnrichmentOutcome {
            enriched,
            pending_app_ids,
        }
    }
}

/// Collects community tag votes for the given titles under the same shared
/// deadline discipline: batches of [`TAG_BATCH_SIZE`], checked against the
/// deadline before each batch, partial results returned on expiry. Failed
/// per-title lookups are simply absent from the result; an empty map is a
/// legitimate outcome.
pub async fn collect_tag_votes(
    community: &Arc<dyn CommunitySource>,
    app_ids: &[u32],
    deadline: Instant,
) -> TagVotes {
    let mut votes: TagVotes = HashMap::new();

    for batch in app_ids.chunks(TAG_BATCH_SIZE) {
        if Instant::now() >= deadline {
            break;
        }

        let mut tasks = Vec::with_capacity(batch.len());
        for appid in batch {
            let community = Arc::clone(community);
            let appid = *appid;
            tasks.push(tokio::spawn(async move {
                (appid, community.app_record(appid).await)
            }));
        }

        // Aggregation is keyed by app id, so completion order is irrelevant.
        for task in tasks {
            match task.await {
                Ok((appid, Some(record))) if !record.tag_votes.is_empty() => {
                    votes.insert(appid, record.tag_votes);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Tag lookup task join error"),
            }
        }
    }

    votes
}
