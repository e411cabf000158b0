use std::collections::HashSet;

use crate::models::{
    CandidateGame, Playstyle, ScoreBreakdown, ScoredCandidate, TasteProfile,
    CATEGORY_COOP, CATEGORY_MULTI_PLAYER, CATEGORY_ONLINE_COOP, CATEGORY_ONLINE_PVP,
    CATEGORY_PVP, CATEGORY_SINGLE_PLAYER,
};

// Sub-score caps. They sum to 100, so a candidate that maxes every
// component scores exactly 100.
const GENRE_CAP: f64 = 30.0;
const TAG_CAP: f64 = 15.0;
const PLAYSTYLE_CAP: f64 = 10.0;
const POPULARITY_CAP: f64 = 15.0;
const TREND_CAP: f64 = 15.0;
const PRICE_CAP: f64 = 10.0;
const REVIEW_CAP: f64 = 5.0;

/// Blend of long-term composite affinity vs trailing-two-week affinity
/// inside the genre sub-score.
const COMPOSITE_WEIGHT: f64 = 0.7;
const RECENT_WEIGHT: f64 = 0.3;

/// Tag sums are divided by at most this many tags, so a title with two
/// strong tags is not outranked by one with twenty weak ones.
const TAG_DIVISOR_CAP: usize = 5;

/// log10(owners) saturates the popularity sub-score at 10^8 owners.
const POPULARITY_LOG_CEILING: f64 = 8.0;

/// Default length of the returned ranking.
pub const DEFAULT_LIMIT: usize = 20;

/// Caller-supplied ranking knobs.
#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    /// Drop candidates priced above this, in whole currency units
    pub max_price: Option<u64>,
    /// Ranking length; `None` means [`DEFAULT_LIMIT`]
    pub limit: Option<usize>,
}

/// Scores one candidate against the profile. Pure and deterministic: the
/// same profile and candidate always produce the same breakdown.
pub fn score_candidate(profile: &TasteProfile, game: &CandidateGame) -> ScoredCandidate {
    let genre_match = genre_match(profile, game);
    let tag_match = tag_match(profile, game);
    let playstyle_match = playstyle_match(profile, game);
    let popularity = popularity(game);
    let recent_trend = recent_trend(game);
    let price_value = price_value(game);
    let review_score = review_score(game);

    // The total is the rounded sum of the raw sub-scores; the breakdown is
    // rounded per component, so the two can differ by rounding only.
    let total = genre_match
        + tag_match
        + playstyle_match
        + popularity
        + recent_trend
        + price_value
        + review_score;

    ScoredCandidate {
        game: game.clone(),
        score: total.round() as u32,
        breakdown: ScoreBreakdown {
            genre_match: round_tenths(genre_match),
            tag_match: round_tenths(tag_match),
            playstyle_match: round_tenths(playstyle_match),
            popularity: round_tenths(popularity),
            recent_trend: round_tenths(recent_trend),
            price_value: round_tenths(price_value),
            review_score: round_tenths(review_score),
        },
    }
}

/// Scores, filters, and ranks the pool.
///
/// Owned titles are excluded first, then the optional price ceiling is
/// applied. The sort is stable and descending by total score, so equal
/// scores keep their pool-priority order.
pub fn rank_candidates(
    profile: &TasteProfile,
    candidates: &[CandidateGame],
    owned_ids: &HashSet<u32>,
    options: &RankOptions,
) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = candidates
        .iter()
        .filter(|c| !owned_ids.contains(&c.appid))
        .filter(|c| options.max_price.map_or(true, |ceiling| c.price <= ceiling))
        .map(|c| score_candidate(profile, c))
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(options.limit.unwrap_or(DEFAULT_LIMIT));
    ranked
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Average blended affinity over the candidate's genres, scaled to the cap.
/// No genre data means no evidence, which scores zero rather than midpoint:
/// unknown-genre titles must earn their place through other signals.
fn genre_match(profile: &TasteProfile, game: &CandidateGame) -> f64 {
    if game.genres.is_empty() {
        return 0.0;
    }

    let blended_sum: f64 = game
        .genres
        .iter()
        .map(|genre| {
            let composite = profile.genre_scores.get(genre).copied().unwrap_or(0.0);
            let recent = profile
                .recent_genre_scores
                .get(genre)
                .copied()
                .unwrap_or(0.0);
            COMPOSITE_WEIGHT * composite + RECENT_WEIGHT * recent
        })
        .sum();

    (blended_sum / game.genres.len() as f64).clamp(0.0, 1.0) * GENRE_CAP
}

fn tag_match(profile: &TasteProfile, game: &CandidateGame) -> f64 {
    if game.tags.is_empty() {
        return 0.0;
    }

    let tag_sum: f64 = game
        .tags
        .iter()
        .filter_map(|tag| profile.tag_scores.get(tag))
        .sum();

    let divisor = game.tags.len().min(TAG_DIVISOR_CAP) as f64;
    (tag_sum / divisor).clamp(0.0, 1.0) * TAG_CAP
}

/// Compatibility between the profile's dominant playstyle and the
/// candidate's play-mode categories. With no category data or no dominant
/// playstyle there is no evidence either way, so the score sits at the
/// midpoint instead of penalizing the candidate.
fn playstyle_match(profile: &TasteProfile, game: &CandidateGame) -> f64 {
    let Some(dominant) = profile.playstyle.dominant() else {
        return PLAYSTYLE_CAP / 2.0;
    };
    if game.categories.is_empty() {
        return PLAYSTYLE_CAP / 2.0;
    }

    let has = |id: u32| game.categories.contains(&id);
    let single = has(CATEGORY_SINGLE_PLAYER);
    let coop = has(CATEGORY_COOP) || has(CATEGORY_ONLINE_COOP);
    let pvp = has(CATEGORY_PVP) || has(CATEGORY_ONLINE_PVP);
    let multi = has(CATEGORY_MULTI_PLAYER) || coop || pvp;

    let factor = match dominant {
        Playstyle::SinglePlayer => match (single, multi) {
            (true, false) => 1.0,
            (true, true) => 0.7,
            (false, true) => 0.2,
            (false, false) => 0.5,
        },
        Playstyle::MultiPlayer => {
            if multi {
                1.0
            } else if single {
                0.3
            } else {
                0.5
            }
        }
        Playstyle::Coop => {
            if coop {
                1.0
            } else if multi {
                0.7
            } else if single {
                0.4
            } else {
                0.5
            }
        }
        Playstyle::Pvp => {
            if pvp {
                1.0
            } else if multi {
                0.7
            } else if single {
                0.3
            } else {
                0.5
            }
        }
    };

    factor * PLAYSTYLE_CAP
}

fn popularity(game: &CandidateGame) -> f64 {
    if game.owners == 0 {
        return 0.0;
    }
    ((game.owners as f64).log10() / POPULARITY_LOG_CEILING).clamp(0.0, 1.0) * POPULARITY_CAP
}

/// Active-player share of the owner base. The ×150 scale saturates at a
/// 10% two-week ratio, which only genuinely hot titles reach.
fn recent_trend(game: &CandidateGame) -> f64 {
    if game.owners == 0 {
        return 0.0;
    }
    let ratio = game.players_2weeks as f64 / game.owners as f64;
    (ratio * 150.0).clamp(0.0, TREND_CAP)
}

/// Hand-tuned value steps. Free titles land mid-table rather than on top;
/// zero price is also what missing price data degrades to, and cheap
/// known-price titles should outrank unknowns.
fn price_value(game: &CandidateGame) -> f64 {
    match game.price {
        0 => 5.0,
        p if p <= 1000 => PRICE_CAP,
        p if p <= 2000 => 8.0,
        p if p <= 4000 => 6.0,
        p if p <= 6000 => 4.0,
        _ => 3.0,
    }
}

fn review_score(game: &CandidateGame) -> f64 {
    let total = game.positive + game.negative;
    if total == 0 {
        return REVIEW_CAP / 2.0;
    }
    game.positive as f64 / total as f64 * REVIEW_CAP
}
