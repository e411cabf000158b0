use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Steam Store category codes for the play-mode facets the profile tracks.
///
/// These are the store's own numeric codes; the online variants are folded
/// into the same buckets as their LAN counterparts.
pub const CATEGORY_SINGLE_PLAYER: u32 = 2;
pub const CATEGORY_MULTI_PLAYER: u32 = 1;
pub const CATEGORY_COOP: u32 = 9;
pub const CATEGORY_ONLINE_COOP: u32 = 38;
pub const CATEGORY_PVP: u32 = 49;
pub const CATEGORY_ONLINE_PVP: u32 = 36;

/// A descriptive genre attached to a title ("Action", "RPG", ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: String,
    pub description: String,
}

/// A play-mode category flag ("Single-player", "Online Co-op", ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u32,
    pub description: String,
}

/// Price information from the store, in minor units of the store currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceOverview {
    pub currency: String,
    /// Final price in minor units (hundredths)
    #[serde(rename = "final")]
    pub final_price: u64,
    #[serde(default)]
    pub discount_percent: u32,
}

/// Catalog metadata for one title, fetched lazily from the store API and
/// cached for a week. Keyed by app id; always requested in one fixed locale
/// so cached entries are comparable across sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppDetails {
    pub name: String,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub price_overview: Option<PriceOverview>,
}

impl AppDetails {
    /// Category codes exposed by this title.
    pub fn category_ids(&self) -> Vec<u32> {
        self.categories.iter().map(|c| c.id).collect()
    }
}

/// Per-title record from the community stats source: descriptive genres plus
/// community tags with their vote counts. Used by the gap filler and by the
/// profile builder's tag signal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommunityRecord {
    pub genres: Vec<String>,
    pub tag_votes: HashMap<String, u64>,
}

impl CommunityRecord {
    /// Tag names ordered by descending vote count.
    pub fn tags_by_votes(&self) -> Vec<String> {
        let mut tags: Vec<(&String, &u64)> = self.tag_votes.iter().collect();
        tags.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        tags.into_iter().map(|(tag, _)| tag.clone()).collect()
    }
}

/// Wire shape of the store's `/api/appdetails` response: a map of app id to
/// a success flag plus payload.
pub type AppDetailsResponse = HashMap<String, AppDetailsEntry>;

#[derive(Debug, Deserialize)]
pub struct AppDetailsEntry {
    pub success: bool,
    #[serde(default)]
    pub data: Option<AppDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_details_defaults_missing_fields() {
        let json = r#"{"name": "Dota 2", "is_free": true}"#;
        let details: AppDetails = serde_json::from_str(json).unwrap();
        assert!(details.genres.is_empty());
        assert!(details.categories.is_empty());
        assert!(details.price_overview.is_none());
    }

    #[test]
    fn test_app_details_response_entry() {
        let json = r#"{
            "570": {
                "success": true,
                "data": {
                    "name": "Dota 2",
                    "is_free": true,
                    "genres": [{"id": "1", "description": "Action"}],
                    "categories": [{"id": 1, "description": "Multi-player"}]
                }
            }
        }"#;
        let parsed: AppDetailsResponse = serde_json::from_str(json).unwrap();
        let entry = parsed.get("570").unwrap();
        assert!(entry.success);
        let data = entry.data.as_ref().unwrap();
        assert_eq!(data.genres[0].description, "Action");
        assert_eq!(data.category_ids(), vec![CATEGORY_MULTI_PLAYER]);
    }

    #[test]
    fn test_app_details_response_failed_entry_has_no_data() {
        let json = r#"{"99999": {"success": false}}"#;
        let parsed: AppDetailsResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.get("99999").unwrap().data.is_none());
    }
}
