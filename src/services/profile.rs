use chrono::Utc;
use std::collections::HashMap;

use crate::models::{
    EnrichedGame, Playstyle, PlaystyleWeights, TasteProfile, CATEGORY_COOP,
    CATEGORY_MULTI_PLAYER, CATEGORY_ONLINE_COOP, CATEGORY_ONLINE_PVP, CATEGORY_PVP,
    CATEGORY_SINGLE_PLAYER,
};

/// How many genres make it into `top_genres`
const TOP_GENRE_COUNT: usize = 5;
/// How many tags make it into `top_tags`
const TOP_TAG_COUNT: usize = 10;

/// Composite weighting of the three genre signals. Recent play dominates so
/// the profile tracks what the user is into now, not what they sank hours
/// into years ago.
const RECENT_WEIGHT: f64 = 0.5;
const CONCENTRATION_WEIGHT: f64 = 0.3;
const TOTAL_WEIGHT: f64 = 0.2;

/// Builds the user's taste profile from their enriched library.
///
/// Titles without genre metadata are excluded from every score map but still
/// count toward `total_games`. `tag_votes` maps app id to community tag vote
/// counts for a top-playtime slice of the library; pass an empty map when tag
/// collection was skipped or timed out, which legitimately yields an empty
/// `tag_scores`.
pub fn build_taste_profile(
    games: &[EnrichedGame],
    tag_votes: &HashMap<u32, HashMap<String, u64>>,
) -> TasteProfile {
    let with_genres: Vec<&EnrichedGame> = games.iter().filter(|g| g.has_genres()).collect();

    // Total-playtime signal: log2 damping so one very-long-played title
    // cannot swamp a genre.
    let mut total_raw: HashMap<String, f64> = HashMap::new();
    for game in &with_genres {
        let weight = ((game.game.playtime_forever + 1) as f64).log2();
        for genre in game.genre_names() {
            *total_raw.entry(genre.to_string()).or_insert(0.0) += weight;
        }
    }

    // Recent-playtime signal: same damping over the two-week window only.
    let mut recent_raw: HashMap<String, f64> = HashMap::new();
    for game in &with_genres {
        let recent = game.game.playtime_2weeks.unwrap_or(0);
        if recent == 0 {
            continue;
        }
        let weight = ((recent + 1) as f64).log2();
        for genre in game.genre_names() {
            *recent_raw.entry(genre.to_string()).or_insert(0.0) += weight;
        }
    }

    // Concentration signal: mean/max playtime per genre. Near 1 when the
    // user spreads play evenly across a genre's titles, near 0 when a single
    // title dominates. Exactly 1 for a single-title genre.
    let mut genre_playtimes: HashMap<String, Vec<u64>> = HashMap::new();
    for game in &with_genres {
        for genre in game.genre_names() {
            genre_playtimes
                .entry(genre.to_string())
                .or_default()
                .push(game.game.playtime_forever);
        }
    }

    let mut concentration_raw: HashMap<String, f64> = HashMap::new();
    for (genre, playtimes) in &genre_playtimes {
        let max = playtimes.iter().copied().max().unwrap_or(0);
        if max == 0 {
            concentration_raw.insert(genre.clone(), 0.0);
            continue;
        }
        let mean = playtimes.iter().sum::<u64>() as f64 / playtimes.len() as f64;
        concentration_raw.insert(genre.clone(), mean / max as f64);
    }

    let total_norm = normalize_scores(&total_raw);
    let recent_norm = normalize_scores(&recent_raw);
    let concentration_norm = normalize_scores(&concentration_raw);

    let mut composite_raw: HashMap<String, f64> = HashMap::new();
    for genre in total_norm
        .keys()
        .chain(recent_norm.keys())
        .chain(concentration_norm.keys())
    {
        if composite_raw.contains_key(genre) {
            continue;
        }
        let total = total_norm.get(genre).copied().unwrap_or(0.0);
        let recent = recent_norm.get(genre).copied().unwrap_or(0.0);
        let concentration = concentration_norm.get(genre).copied().unwrap_or(0.0);
        composite_raw.insert(
            genre.clone(),
            recent * RECENT_WEIGHT + concentration * CONCENTRATION_WEIGHT + total * TOTAL_WEIGHT,
        );
    }

    let genre_scores = normalize_scores(&composite_raw);
    let top_genres = top_keys(&genre_scores, TOP_GENRE_COUNT);

    let tag_scores = build_tag_scores(tag_votes);
    let top_tags = top_keys(&tag_scores, TOP_TAG_COUNT);

    let total_playtime: u64 = with_genres.iter().map(|g| g.game.playtime_forever).sum();
    let avg_playtime = if with_genres.is_empty() {
        0
    } else {
        (total_playtime as f64 / with_genres.len() as f64).round() as u64
    };

    TasteProfile {
        genre_scores,
        recent_genre_scores: recent_norm,
        tag_scores,
        top_genres,
        top_tags,
        playstyle: build_playstyle_weights(games),
        total_games: games.len(),
        total_playtime_minutes: total_playtime,
        avg_playtime_minutes: avg_playtime,
        built_at: Utc::now(),
    }
}

/// Max-normalizes a score map to [0, 1]. An empty or all-zero map
/// normalizes to the empty map: no signal, not a zeroed signal.
pub fn normalize_scores(scores: &HashMap<String, f64>) -> HashMap<String, f64> {
    let max = scores.values().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return HashMap::new();
    }
    scores.iter().map(|(k, v)| (k.clone(), v / max)).collect()
}

/// The `count` highest-scoring keys, descending.
fn top_keys(scores: &HashMap<String, f64>, count: usize) -> Vec<String> {
    let mut entries: Vec<(&String, &f64)> = scores.iter().collect();
    entries.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
        .into_iter()
        .take(count)
        .map(|(k, _)| k.clone())
        .collect()
}

/// Vote-weighted tag affinities over the collected slice of the library,
/// max-normalized like every other score map.
fn build_tag_scores(tag_votes: &HashMap<u32, HashMap<String, u64>>) -> HashMap<String, f64> {
    let mut raw: HashMap<String, f64> = HashMap::new();
    for votes in tag_votes.values() {
        for (tag, count) in votes {
            *raw.entry(tag.clone()).or_insert(0.0) += *count as f64;
        }
    }
    normalize_scores(&raw)
}

/// Accumulates playtime-weighted evidence per play-mode facet from the
/// category flags on each title, then max-normalizes. Online variants fold
/// into the same buckets as their plain counterparts.
fn build_playstyle_weights(games: &[EnrichedGame]) -> PlaystyleWeights {
    let mut weights = PlaystyleWeights::default();

    for game in games {
        let Some(details) = &game.details else {
            continue;
        };
        if details.categories.is_empty() {
            continue;
        }
        let weight = ((game.game.playtime_forever + 1) as f64).log2();
        let ids = details.category_ids();

        if ids.contains(&CATEGORY_SINGLE_PLAYER) {
            weights.single_player += weight;
        }
        if ids.contains(&CATEGORY_MULTI_PLAYER) {
            weights.multi_player += weight;
        }
        if ids.contains(&CATEGORY_COOP) || ids.contains(&CATEGORY_ONLINE_COOP) {
            weights.coop += weight;
        }
        if ids.contains(&CATEGORY_PVP) || ids.contains(&CATEGORY_ONLINE_PVP) {
            weights.pvp += weight;
        }
    }

    let max = Playstyle::ALL
        .iter()
        .map(|s| weights.get(*s))
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        for style in Playstyle::ALL {
            weights.set(style, weights.get(style) / max);
        }
    }
    weights
}
