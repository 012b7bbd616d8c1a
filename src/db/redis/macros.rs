/// Read-through lookup against the Redis cache
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`,
/// queues its result for a background write with `$ttl` seconds to live and
/// returns it. A failed cache read counts as a miss, so the origin is still
/// reached while Redis is down. Errors from the block propagate with `?`; the
/// enclosing function must return `AppResult`.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, CacheKey::GenreSeeds, GENRE_SEEDS_TTL, async move {
///     self.load_genre_seeds().await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(hit) = $cache.lookup(&key).await {
            tracing::debug!(key = %key, "Cache hit");
            Ok(hit)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
