use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Candidate pool sources, in scoring-priority order.
///
/// When a title appears in more than one source the highest-priority source
/// wins during deduplication, so genre relevance trumps generic popularity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PoolSource {
    /// SteamSpy genre lists for the user's top genres
    GenreMatched,
    /// All-time top 100, the classic/niche slot
    AllTimePopular,
    /// Top 100 by players over the last two weeks
    Trending,
    /// Store new releases (no genre metadata upstream)
    NewRelease,
    /// Store specials (no genre metadata upstream)
    OnSale,
}

impl PoolSource {
    /// Every source, in priority order.
    pub const ALL: [PoolSource; 5] = [
        PoolSource::GenreMatched,
        PoolSource::AllTimePopular,
        PoolSource::Trending,
        PoolSource::NewRelease,
        PoolSource::OnSale,
    ];

    /// Sources enabled when the caller does not choose: everything except
    /// on-sale.
    pub const DEFAULT: [PoolSource; 4] = [
        PoolSource::GenreMatched,
        PoolSource::AllTimePopular,
        PoolSource::Trending,
        PoolSource::NewRelease,
    ];
}

impl std::str::FromStr for PoolSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genre_matched" => Ok(PoolSource::GenreMatched),
            "all_time_popular" => Ok(PoolSource::AllTimePopular),
            "trending" => Ok(PoolSource::Trending),
            "new_release" => Ok(PoolSource::NewRelease),
            "on_sale" => Ok(PoolSource::OnSale),
            other => Err(format!("unknown pool source: {}", other)),
        }
    }
}

impl Display for PoolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PoolSource::GenreMatched => "genre_matched",
            PoolSource::AllTimePopular => "all_time_popular",
            PoolSource::Trending => "trending",
            PoolSource::NewRelease => "new_release",
            PoolSource::OnSale => "on_sale",
        };
        write!(f, "{}", name)
    }
}

/// A potential recommendation in canonical form.
///
/// Invariant: regardless of which source produced it, `price` is in whole
/// currency units and `owners` is a single resolved count (midpoint of the
/// published range where the source reports one). Missing numeric fields are
/// zero; an empty `genres` list marks the title as eligible for gap filling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateGame {
    pub appid: u32,
    pub name: String,
    /// Estimated owner count (resolved range midpoint)
    pub owners: u64,
    /// Players over the trailing two weeks
    pub players_2weeks: u64,
    /// Price in whole currency units
    pub price: u64,
    pub positive: u64,
    pub negative: u64,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Play-mode category codes, empty when unknown
    #[serde(default)]
    pub categories: Vec<u32>,
    /// Which pool source this candidate came from
    pub source: PoolSource,
}

/// Named sub-scores; their sum equals the candidate's total up to rounding.
/// Each value is rounded to one decimal and bounded by its cap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub genre_match: f64,
    pub tag_match: f64,
    pub playstyle_match: f64,
    pub popularity: f64,
    pub recent_trend: f64,
    pub price_value: f64,
    pub review_score: f64,
}

/// A candidate with its total score (0-100) and breakdown attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub game: CandidateGame,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
}
