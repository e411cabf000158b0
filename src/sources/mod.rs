/// Upstream data-source abstractions
///
/// The pipeline depends on these traits rather than on concrete HTTP
/// clients, so the core stays testable and a source can be swapped without
/// touching the services. Each implementation owns its cache policy.
///
/// Failure contract, per source:
/// - the owned-library source is the only one allowed to return an error
///   (missing credentials or an upstream auth failure is fatal for the
///   request);
/// - catalog and community lookups degrade to `None` / empty and never
///   surface errors to the pipeline.
use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{AppDetails, CandidateGame, CommunityRecord, OwnedGame},
};

pub mod steam;
pub mod steam_store;
pub mod steamspy;

pub use steam::SteamWebApi;
pub use steam_store::SteamStoreApi;
pub use steamspy::SteamSpyApi;

/// The user's owned-library source.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LibrarySource: Send + Sync {
    /// Fetches the user's owned titles with playtimes. Cached ~1 hour.
    ///
    /// Errors are fatal for the calling request: a missing API key or an
    /// upstream rejection means no profile can be built at all.
    async fn owned_games(&self, steam_id: &str) -> AppResult<Vec<OwnedGame>>;
}

/// The store catalog: per-title metadata plus the featured feeds.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Catalog metadata for one title, `None` on any failure. Cached ~7 days.
    async fn app_details(&self, appid: u32) -> Option<AppDetails>;

    /// Featured new releases; empty on failure. These entries carry no genre
    /// metadata. Cached ~6 hours.
    async fn new_releases(&self) -> Vec<CandidateGame>;

    /// Featured specials (on sale); empty on failure, no genre metadata.
    /// Cached ~1 hour.
    async fn specials(&self) -> Vec<CandidateGame>;
}

/// Community playtime/ownership statistics (SteamSpy).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CommunitySource: Send + Sync {
    /// Titles listed under one genre; empty on failure. Cached ~24 hours.
    async fn games_by_genre(&self, genre: &str) -> Vec<CandidateGame>;

    /// All-time top 100, the classic/niche slot. Cached ~24 hours.
    async fn top_all_time(&self) -> Vec<CandidateGame>;

    /// Two-week top 100, the trending slot. Cached ~24 hours.
    async fn top_recent(&self) -> Vec<CandidateGame>;

    /// Per-title genre and community tag votes, `None` on failure.
    /// Cached ~24 hours.
    async fn app_record(&self, appid: u32) -> Option<CommunityRecord>;
}

/// Collected tag votes keyed by app id.
pub type TagVotes = HashMap<u32, HashMap<String, u64>>;
