use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Steam Web API key, required for owned-library lookups
    pub steam_api_key: String,

    /// Redis connection URL; when empty, caching is disabled entirely
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Steam Web API base URL
    #[serde(default = "default_steam_api_url")]
    pub steam_api_url: String,

    /// Steam Store API base URL
    #[serde(default = "default_store_api_url")]
    pub store_api_url: String,

    /// SteamSpy API base URL
    #[serde(default = "default_steamspy_api_url")]
    pub steamspy_api_url: String,

    /// Store locale used for all catalog metadata lookups. Fixed per
    /// deployment so cached entries stay comparable across sources.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Store country code; determines which storefront prices come from
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_steam_api_url() -> String {
    "https://api.steampowered.com".to_string()
}

fn default_store_api_url() -> String {
    "https://store.steampowered.com/api".to_string()
}

fn default_steamspy_api_url() -> String {
    "https://steamspy.com/api.php".to_string()
}

fn default_locale() -> String {
    "english".to_string()
}

fn default_country_code() -> String {
    "us".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
