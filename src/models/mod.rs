mod candidate;
mod catalog;
mod owned;
mod profile;

pub use candidate::{CandidateGame, PoolSource, ScoreBreakdown, ScoredCandidate};
pub use catalog::{
    AppDetails, AppDetailsEntry, AppDetailsResponse, Category, CommunityRecord, Genre,
    PriceOverview,
    CATEGORY_COOP, CATEGORY_MULTI_PLAYER, CATEGORY_ONLINE_COOP, CATEGORY_ONLINE_PVP,
    CATEGORY_PVP, CATEGORY_SINGLE_PLAYER,
};
pub use owned::{EnrichedGame, OwnedGame, OwnedGamesBody, OwnedGamesResponse};
pub use profile::{Playstyle, PlaystyleWeights, TasteProfile};
