use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four play-mode facets tracked by the taste profile, in tie-break
/// order: when two weights are equal the earlier variant wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Playstyle {
    SinglePlayer,
    MultiPlayer,
    Coop,
    Pvp,
}

impl Playstyle {
    pub const ALL: [Playstyle; 4] = [
        Playstyle::SinglePlayer,
        Playstyle::MultiPlayer,
        Playstyle::Coop,
        Playstyle::Pvp,
    ];
}

/// Playtime-weighted evidence per play-mode facet.
///
/// Weights are non-negative and max-normalized to [0, 1] when any signal
/// exists; they do not sum to 1.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaystyleWeights {
    pub single_player: f64,
    pub multi_player: f64,
    pub coop: f64,
    pub pvp: f64,
}

impl PlaystyleWeights {
    pub fn get(&self, style: Playstyle) -> f64 {
        match style {
            Playstyle::SinglePlayer => self.single_player,
            Playstyle::MultiPlayer => self.multi_player,
            Playstyle::Coop => self.coop,
            Playstyle::Pvp => self.pvp,
        }
    }

    pub fn set(&mut self, style: Playstyle, value: f64) {
        match style {
            Playstyle::SinglePlayer => self.single_player = value,
            Playstyle::MultiPlayer => self.multi_player = value,
            Playstyle::Coop => self.coop = value,
            Playstyle::Pvp => self.pvp = value,
        }
    }

    /// The facet with the largest weight, or `None` when no evidence was
    /// accumulated. Ties resolve in `Playstyle::ALL` order.
    pub fn dominant(&self) -> Option<Playstyle> {
        let mut best: Option<(Playstyle, f64)> = None;
        for style in Playstyle::ALL {
            let weight = self.get(style);
            if weight <= 0.0 {
                continue;
            }
            match best {
                Some((_, w)) if weight <= w => {}
                _ => best = Some((style, weight)),
            }
        }
        best.map(|(style, _)| style)
    }
}

/// The user's derived taste model.
///
/// Every score map is either empty (no signal) or max-normalized so that
/// its largest entry is exactly 1.0. Rebuilt wholesale from the enriched
/// library; one snapshot is cached per user for about an hour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TasteProfile {
    /// Genre name -> composite affinity score in [0, 1]
    pub genre_scores: HashMap<String, f64>,
    /// Genre name -> trailing-two-week affinity, independently normalized
    pub recent_genre_scores: HashMap<String, f64>,
    /// Community tag -> vote-weighted affinity in [0, 1]
    pub tag_scores: HashMap<String, f64>,
    /// Top 5 genres by composite score, descending
    pub top_genres: Vec<String>,
    /// Top tags by vote-weighted frequency, descending
    pub top_tags: Vec<String>,
    pub playstyle: PlaystyleWeights,
    pub total_games: usize,
    pub total_playtime_minutes: u64,
    pub avg_playtime_minutes: u64,
    pub built_at: DateTime<Utc>,
}

impl TasteProfile {
    /// True when the library produced no genre signal at all; callers must
    /// treat this as "insufficient data", not as an error.
    pub fn has_signal(&self) -> bool {
        !self.top_genres.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_none_when_empty() {
        assert_eq!(PlaystyleWeights::default().dominant(), None);
    }

    #[test]
    fn test_dominant_picks_largest() {
        let weights = PlaystyleWeights {
            single_player: 0.4,
            multi_player: 1.0,
            coop: 0.2,
            pvp: 0.9,
        };
        assert_eq!(weights.dominant(), Some(Playstyle::MultiPlayer));
    }

    #[test]
    fn test_dominant_tie_breaks_in_enum_order() {
        let weights = PlaystyleWeights {
            single_player: 1.0,
            multi_player: 1.0,
            coop: 1.0,
            pvp: 1.0,
        };
        assert_eq!(weights.dominant(), Some(Playstyle::SinglePlayer));
    }

    #[test]
    fn test_profile_signal_tracks_top_genres() {
        let profile = TasteProfile {
            genre_scores: HashMap::new(),
            recent_genre_scores: HashMap::new(),
            tag_scores: HashMap::new(),
            top_genres: vec![],
            top_tags: vec![],
            playstyle: PlaystyleWeights::default(),
            total_games: 0,
            total_playtime_minutes: 0,
            avg_playtime_minutes: 0,
            built_at: Utc::now(),
        };
        assert!(!profile.has_signal());
    }
}
