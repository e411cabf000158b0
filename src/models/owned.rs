use serde::{Deserialize, Serialize};

use super::AppDetails;

/// A title in the user's owned library, as returned by the Steam Web API.
///
/// Playtimes are in minutes. `playtime_2weeks` is absent when the title was
/// not played in the trailing two-week window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnedGame {
    pub appid: u32,
    pub name: String,
    /// Total playtime in minutes
    pub playtime_forever: u64,
    /// Playtime over the trailing two weeks, in minutes
    #[serde(default)]
    pub playtime_2weeks: Option<u64>,
}

/// Wire shape of `IPlayerService/GetOwnedGames/v1`
#[derive(Debug, Deserialize)]
pub struct OwnedGamesResponse {
    #[serde(default)]
    pub response: OwnedGamesBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct OwnedGamesBody {
    #[serde(default)]
    pub games: Vec<OwnedGame>,
}

/// An owned title with catalog metadata attached by enrichment.
///
/// `details` is `None` when the catalog lookup failed, timed out, or was not
/// reached within the enrichment time budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedGame {
    #[serde(flatten)]
    pub game: OwnedGame,
    #[serde(default)]
    pub details: Option<AppDetails>,
}

impl EnrichedGame {
    pub fn new(game: OwnedGame, details: Option<AppDetails>) -> Self {
        Self { game, details }
    }

    /// Genre names attached by enrichment, empty when metadata is missing.
    pub fn genre_names(&self) -> Vec<&str> {
        self.details
            .as_ref()
            .map(|d| d.genres.iter().map(|g| g.description.as_str()).collect())
            .unwrap_or_default()
    }

    /// True when this title carries at least one genre and so contributes to
    /// the taste profile's score maps.
    pub fn has_genres(&self) -> bool {
        self.details
            .as_ref()
            .is_some_and(|d| !d.genres.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_game_deserializes_without_recent_playtime() {
        let json = r#"{"appid": 440, "name": "Team Fortress 2", "playtime_forever": 1200}"#;
        let game: OwnedGame = serde_json::from_str(json).unwrap();
        assert_eq!(game.appid, 440);
        assert_eq!(game.playtime_2weeks, None);
    }

    #[test]
    fn test_owned_games_response_tolerates_empty_body() {
        let json = r#"{"response": {}}"#;
        let parsed: OwnedGamesResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.response.games.is_empty());
    }

    #[test]
    fn test_enriched_game_without_details_has_no_genres() {
        let game = OwnedGame {
            appid: 10,
            name: "Counter-Strike".to_string(),
            playtime_forever: 300,
            playtime_2weeks: Some(60),
        };
        let enriched = EnrichedGame::new(game, None);
        assert!(!enriched.has_genres());
        assert!(enriched.genre_names().is_empty());
    }
}
