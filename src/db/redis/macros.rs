/// A macro to simplify cache-through logic for best-effort lookups.
///
/// Checks the cache for `$key`; on a miss, awaits `$block` to compute the
/// value, stores it in the background with the given TTL, and returns it.
/// The block must produce a plain (non-`Result`) value — sources that can
/// fail are expected to have already degraded to an empty/default value,
/// which is cached like any other so a flapping upstream is not hammered.
///
/// # Arguments
/// * `$cache`: a [`crate::db::Cache`]
/// * `$key`: the [`crate::db::CacheKey`] to use
/// * `$ttl`: time-to-live in seconds
/// * `$block`: the future to await on a cache miss
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await {
            cached
        } else {
            let value = $block.await;
            $cache.set_in_background(&$key, &value, $ttl);
            value
        }
    }};
}
