use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppResult;

/// Typed cache keys for everything this service stores.
///
/// TTLs are chosen where the value is written, not here; the key only
/// determines identity. Catalog metadata is keyed by app id alone because
/// the store locale is fixed per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Owned library for one user
    OwnedGames(String),
    /// Taste profile snapshot for one user
    Profile(String),
    /// Store catalog metadata for one title
    AppDetails(u32),
    /// SteamSpy per-title record (genre + community tags)
    AppRecord(u32),
    /// SteamSpy genre listing
    GenrePool(String),
    /// SteamSpy all-time top 100
    TopAllTime,
    /// SteamSpy two-week top 100
    TopRecent,
    /// Store featured new releases
    NewReleases,
    /// Store featured specials
    Specials,
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::OwnedGames(steam_id) => write!(f, "user:{}:owned", steam_id),
            CacheKey::Profile(steam_id) => write!(f, "user:{}:profile:v2", steam_id),
            CacheKey::AppDetails(appid) => write!(f, "appdetails:{}", appid),
            CacheKey::AppRecord(appid) => write!(f, "steamspy:app:{}", appid),
            CacheKey::GenrePool(genre) => write!(f, "steamspy:genre:{}", genre.to_lowercase()),
            CacheKey::TopAllTime => write!(f, "steamspy:top100forever"),
            CacheKey::TopRecent => write!(f, "steamspy:top100in2weeks"),
            CacheKey::NewReleases => write!(f, "steam:new_releases"),
            CacheKey::Specials => write!(f, "steam:specials"),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Cache handler for storing and retrieving data from Redis.
///
/// Caching is strictly best-effort: read errors degrade to a miss and write
/// errors are logged and dropped. A `Cache` built with [`Cache::disabled`]
/// carries no backend at all, which is the supported no-caching mode.
#[derive(Clone)]
pub struct Cache {
    inner: Option<CacheInner>,
}

#[derive(Clone)]
struct CacheInner {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl CacheWriterHandle {
    /// Sends a shutdown signal to the writer task so it can flush pending
    /// writes before the process exits.
    pub async fn shutdown(self) {
        if let Some(tx) = self.shutdown_tx {
            let _ = tx.send(()).await;
            tracing::info!("Cache writer shutdown signal sent");
        }
    }
}

impl Cache {
    /// Creates a cache backed by Redis, spawning a background task that
    /// drains queued writes so cache population never blocks a response.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            inner: Some(CacheInner {
                redis_client,
                write_tx,
            }),
        };

        let handle = CacheWriterHandle {
            shutdown_tx: Some(shutdown_tx),
        };

        (cache, handle)
    }

    /// Creates a cache with no backend: every read misses and every write is
    /// discarded. Used when Redis is not configured and in tests.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Background task that processes cache write messages, flushing any
    /// remaining messages on shutdown.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");

                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis
    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key.
    ///
    /// Any failure (no backend, connection error, stale serialization shape)
    /// is reported as a miss so callers always fall through to the real
    /// fetch.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> Option<T> {
        let inner = self.inner.as_ref()?;

        let mut conn = match inner.redis_client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache connection failed, treating as miss");
                return None;
            }
        };

        let cached: Option<String> = match conn.get(format!("{}", key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match cached {
            Some(json) => match serde_json::from_str(&json) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Cache entry undeserializable, treating as miss");
                    None
                }
            },
            None => None,
        }
    }

    /// Stores a value in the cache asynchronously without blocking.
    ///
    /// The value is serialized here and handed to the background writer; the
    /// Redis write happens later. No-op when caching is disabled.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let Some(inner) = self.inner.as_ref() else {
            return;
        };

        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: format!("{}", key),
            value: json,
            ttl,
        };

        if let Err(e) = inner.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}
