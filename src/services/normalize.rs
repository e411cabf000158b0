use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{CandidateGame, PoolSource};

/// Price unit a raw source reports in.
///
/// This is a documented per-source contract, not something inferred at
/// runtime: SteamSpy reports minor units (hundredths), the store's featured
/// feeds already report the canonical major unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUnit {
    /// Hundredths of the canonical unit; divided by 100 and rounded
    MinorUnits,
    /// Already canonical; passed through unchanged
    MajorUnits,
}

/// Converts a raw price into whole canonical currency units.
pub fn to_major_units(raw: u64, unit: PriceUnit) -> u64 {
    match unit {
        PriceUnit::MinorUnits => ((raw as f64) / 100.0).round() as u64,
        PriceUnit::MajorUnits => raw,
    }
}

/// Resolves an owner-count field like `"1,000,000 .. 2,000,000"` to the
/// rounded midpoint of the range. A single numeric string parses directly;
/// anything unparsable resolves to 0.
pub fn parse_owner_range(owners: &str) -> u64 {
    let cleaned = owners.replace(',', "");
    if let Some((low, high)) = cleaned.split_once(" .. ") {
        let low: u64 = low.trim().parse().unwrap_or(0);
        let high: u64 = high.trim().parse().unwrap_or(0);
        // Widen before summing: bounds near u64::MAX must not overflow.
        // Adding one before halving rounds a .5 midpoint up.
        return ((low as u128 + high as u128 + 1) / 2) as u64;
    }
    cleaned.trim().parse().unwrap_or(0)
}

/// A numeric field that some upstreams serialize as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Num(i64),
    Str(String),
}

impl NumberOrString {
    fn as_u64(&self) -> u64 {
        match self {
            NumberOrString::Num(n) => (*n).max(0) as u64,
            NumberOrString::Str(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

/// A SteamSpy record as it appears on the wire. Every field except the app
/// id is optional or loosely typed; list endpoints omit tags, per-title
/// lookups include them, and price arrives as either a string or a number.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSpyRecord {
    pub appid: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owners: Option<NumberOrString>,
    #[serde(default)]
    pub players_2weeks: Option<i64>,
    #[serde(default)]
    pub price: Option<NumberOrString>,
    #[serde(default)]
    pub positive: Option<i64>,
    #[serde(default)]
    pub negative: Option<i64>,
    #[serde(default)]
    pub genre: Option<String>,
    /// Tag -> vote count map, but SteamSpy serializes "no tags" as `[]`
    #[serde(default)]
    pub tags: Option<serde_json::Value>,
}

/// Splits a comma-separated genre field into trimmed, non-empty names.
pub fn split_genre_csv(genre: &str) -> Vec<String> {
    genre
        .split(',')
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(|g| g.to_string())
        .collect()
}

/// Extracts tag vote counts from SteamSpy's loosely-typed tags field.
/// Anything that is not an object of numeric votes yields an empty map.
pub fn parse_tag_votes(tags: Option<&serde_json::Value>) -> HashMap<String, u64> {
    let Some(serde_json::Value::Object(map)) = tags else {
        return HashMap::new();
    };
    map.iter()
        .filter_map(|(tag, votes)| votes.as_u64().map(|v| (tag.clone(), v)))
        .collect()
}

/// Normalizes a raw SteamSpy record into the canonical candidate shape.
///
/// SteamSpy prices are minor units. Malformed fields degrade to zero or
/// empty; this function never fails.
pub fn normalize_spy_record(raw: &RawSpyRecord, source: PoolSource) -> CandidateGame {
    let owners = match &raw.owners {
        Some(NumberOrString::Str(s)) => parse_owner_range(s),
        Some(NumberOrString::Num(n)) => (*n).max(0) as u64,
        None => 0,
    };

    let price_raw = raw.price.as_ref().map(NumberOrString::as_u64).unwrap_or(0);
    let tag_votes = parse_tag_votes(raw.tags.as_ref());
    let mut tags: Vec<(String, u64)> = tag_votes.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    CandidateGame {
        appid: raw.appid,
        name: raw.name.clone().unwrap_or_default(),
        owners,
        players_2weeks: raw.players_2weeks.map(|n| n.max(0) as u64).unwrap_or(0),
        price: to_major_units(price_raw, PriceUnit::MinorUnits),
        positive: raw.positive.map(|n| n.max(0) as u64).unwrap_or(0),
        negative: raw.negative.map(|n| n.max(0) as u64).unwrap_or(0),
        genres: raw.genre.as_deref().map(split_genre_csv).unwrap_or_default(),
        tags: tags.into_iter().map(|(tag, _)| tag).collect(),
        categories: Vec::new(),
        source,
    }
}

/// An entry from the store's featured-categories feed (new releases and
/// specials). These feeds carry no ownership, review, or genre data.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeaturedItem {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub final_price: Option<u64>,
}

/// Normalizes a featured-feed entry. Prices here are already in the
/// canonical major unit; the missing genre list is expected and left for
/// the gap filler.
pub fn normalize_featured_item(raw: &RawFeaturedItem, source: PoolSource) -> CandidateGame {
    CandidateGame {
        appid: raw.id,
        name: raw.name.clone(),
        owners: 0,
        players_2weeks: 0,
        price: to_major_units(raw.final_price.unwrap_or(0), PriceUnit::MajorUnits),
        positive: 0,
        negative: 0,
        genres: Vec::new(),
        tags: Vec::new(),
        categories: Vec::new(),
        source,
    }
}
