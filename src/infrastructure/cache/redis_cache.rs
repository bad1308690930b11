//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, effective_ttl};
use crate::domain::entities::UrlRecord;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

const URL_KEY_PREFIX: &str = "url:";
const CLICKS_KEY_PREFIX: &str = "clicks:";

/// Redis cache for URL records and cache-side click counters.
///
/// # Key Layout
///
/// - `url:{code}` - JSON-encoded [`UrlRecord`], written with `SETEX`
/// - `clicks:{code}` - integer counter, updated with `INCR`, no expiry
///
/// Uses `ConnectionManager` for automatic reconnection; clones share the
/// underlying multiplexed connection.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied when [`CacheService::set_url`] is
    ///   called with `ttl_seconds = 0`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
        })
    }

    fn url_key(short_code: &str) -> String {
        format!("{}{}", URL_KEY_PREFIX, short_code)
    }

    fn clicks_key(short_code: &str) -> String {
        format!("{}{}", CLICKS_KEY_PREFIX, short_code)
    }
}

fn operation_error(e: redis::RedisError) -> CacheError {
    CacheError::OperationError(e.to_string())
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<UrlRecord>> {
        let mut conn = self.client.clone();

        let payload = conn
            .get::<_, Option<String>>(Self::url_key(short_code))
            .await
            .map_err(operation_error)?;

        match payload {
            Some(json) => {
                let record = serde_json::from_str(&json)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                debug!(short_code, "Cache HIT");
                Ok(Some(record))
            }
            None => {
                debug!(short_code, "Cache MISS");
                Ok(None)
            }
        }
    }

    async fn set_url(&self, record: &UrlRecord, ttl_seconds: u64) -> CacheResult<()> {
        let ttl = effective_ttl(ttl_seconds, self.default_ttl);

        let payload = serde_json::to_string(record)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        let mut conn = self.client.clone();
        conn.set_ex::<_, _, ()>(Self::url_key(&record.short_code), payload, ttl)
            .await
            .map_err(operation_error)?;

        debug!(short_code = %record.short_code, ttl, "Cache SET");
        Ok(())
    }

    async fn delete_url(&self, short_code: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();

        let deleted = conn
            .del::<_, i32>(Self::url_key(short_code))
            .await
            .map_err(operation_error)?;

        if deleted > 0 {
            debug!(short_code, "Cache DELETE");
        }
        Ok(())
    }

    async fn increment_click_count(&self, short_code: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();

        conn.incr::<_, _, i64>(Self::clicks_key(short_code), 1)
            .await
            .map_err(operation_error)?;

        Ok(())
    }

    async fn get_click_count(&self, short_code: &str) -> CacheResult<i64> {
        let mut conn = self.client.clone();

        let count = conn
            .get::<_, Option<i64>>(Self::clicks_key(short_code))
            .await
            .map_err(operation_error)?;

        Ok(count.unwrap_or(0))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(RedisCache::url_key("abc123"), "url:abc123");
        assert_eq!(RedisCache::clicks_key("abc123"), "clicks:abc123");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let result = RedisCache::connect("not a redis url", 60).await;
        assert!(matches!(result, Err(CacheError::ConnectionError(_))));
    }
}
