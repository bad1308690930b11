//! Caching layer for fast redirect lookups.
//!
//! Provides a [`CacheService`] trait with two implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`MemoryCache`] - In-process cache for tests and single-node runs

mod memory_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use service::{
    CacheError, CacheResult, CacheService, MAX_CACHE_TTL_SECONDS, effective_ttl,
};

#[cfg(test)]
pub use service::MockCacheService;
