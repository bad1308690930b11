//! Cache service trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::UrlRecord;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),

    #[error("Cache serialization error: {0}")]
    SerializationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Longest TTL a cached record may get (30 days). Larger values are clamped.
pub const MAX_CACHE_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Resolves the TTL for a write: 0 selects `default_ttl`, anything above
/// [`MAX_CACHE_TTL_SECONDS`] is clamped.
pub fn effective_ttl(ttl_seconds: u64, default_ttl: u64) -> u64 {
    let ttl = if ttl_seconds == 0 {
        default_ttl
    } else {
        ttl_seconds
    };
    ttl.min(MAX_CACHE_TTL_SECONDS)
}

/// Volatile projection of the store, keyed by short code.
///
/// Holds two independent things per code: the full [`UrlRecord`] (with a TTL)
/// and a cache-side click counter. The cache counter is incremented on cache
/// hits only and is never merged with the store's `click_count`; the two are
/// separate, approximate views.
///
/// Implementations report failures as errors. Callers decide how to absorb
/// them; the redirect path treats every cache error as a miss.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process cache
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached record for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` on cache hit
    /// - `Ok(None)` on miss or expiry
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<UrlRecord>>;

    /// Caches a record under its short code.
    ///
    /// A `ttl_seconds` of 0 selects the implementation's default TTL. TTLs
    /// above [`MAX_CACHE_TTL_SECONDS`] are clamped.
    async fn set_url(&self, record: &UrlRecord, ttl_seconds: u64) -> CacheResult<()>;

    /// Removes the cached record for a short code. Missing keys are not an error.
    async fn delete_url(&self, short_code: &str) -> CacheResult<()>;

    /// Adds one to the cache-side click counter.
    async fn increment_click_count(&self, short_code: &str) -> CacheResult<()>;

    /// Returns the cache-side click counter, 0 if it was never incremented.
    async fn get_click_count(&self, short_code: &str) -> CacheResult<i64>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;
}
