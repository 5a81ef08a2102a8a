//! Redis connection and the shared sliding-window rate limiter.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::{aio::ConnectionManager, Client, RedisError, Script};
use uuid::Uuid;

use super::rate_limit::RateLimiter;
use crate::config::CACHE_PREFIX_RATE_LIMIT;
use crate::errors::{AppError, AppResult};

/// Redis wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis, returning an error instead of panicking.
    pub async fn try_connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Redis connected");
        Ok(Self { connection })
    }

    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}

/// Prune, count and conditionally add in one server-side step.
///
/// KEYS[1] key; ARGV now_ms, window_start_ms, max, member, ttl_seconds.
/// Returns `{count, allowed}` with `count` including the new hit when allowed.
static SLIDING_WINDOW: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', ARGV[2])
        local count = redis.call('ZCARD', KEYS[1])
        if count >= tonumber(ARGV[3]) then
            return {count, 0}
        end
        redis.call('ZADD', KEYS[1], ARGV[1], ARGV[4])
        redis.call('EXPIRE', KEYS[1], ARGV[5])
        return {count + 1, 1}
        ",
    )
});

#[async_trait]
impl RateLimiter for Cache {
    /// Sorted set per key scored by hit time in milliseconds.
    async fn hit(&self, key: &str, max: u64, window_seconds: u64) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, key);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_start = now_ms - (window_seconds as i64) * 1000;
        let member = format!("{}-{}", now_ms, Uuid::new_v4());
        let mut conn = self.connection.clone();

        let (count, allowed): (u64, u64) = SLIDING_WINDOW
            .key(&key)
            .arg(now_ms)
            .arg(window_start)
            .arg(max)
            .arg(member)
            .arg(window_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok((count, allowed == 1))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn is_healthy(&self) -> bool {
        self.ping().await.is_ok()
    }
}

fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs only when a Redis server is reachable at REDIS_URL.
    async fn local_cache() -> Option<Cache> {
        let url = std::env::var("REDIS_URL").ok()?;
        Cache::try_connect(&url).await.ok()
    }

    #[tokio::test]
    async fn concurrent_hits_never_exceed_the_limit() {
        let Some(cache) = local_cache().await else {
            return;
        };
        let key = format!("test:{}", Uuid::new_v4());

        let hits = (0..20).map(|_| {
            let cache = cache.clone();
            let key = key.clone();
            async move { cache.hit(&key, 5, 60).await }
        });
        let results = futures::future::join_all(hits).await;

        let allowed = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|(_, allowed)| *allowed)
            .count();
        assert_eq!(allowed, 5);
        assert_eq!(cache.hit(&key, 5, 60).await.unwrap(), (5, false));
    }
}
