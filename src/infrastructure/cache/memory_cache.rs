//! In-process cache built on Moka, with a TTL per record.

use super::service::{CacheResult, CacheService, effective_ttl};
use crate::domain::entities::UrlRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default maximum number of cached records.
pub const DEFAULT_MEMORY_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct CachedRecord {
    record: UrlRecord,
    ttl: Duration,
}

/// Expires each record after the TTL it was written with. Rewriting a
/// record restarts its TTL.
struct PerRecordTtl;

impl Expiry<String, CachedRecord> for PerRecordTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedRecord,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedRecord,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Cache held in process memory.
///
/// Mirrors the Redis key layout: records expire after their TTL and are
/// bounded by a maximum capacity, click counters never expire and live in
/// their own map.
#[derive(Clone)]
pub struct MemoryCache {
    default_ttl: u64,
    urls: Cache<String, CachedRecord>,
    clicks: Arc<DashMap<String, i64>>,
}

impl MemoryCache {
    /// Creates an empty cache holding up to [`DEFAULT_MEMORY_CACHE_CAPACITY`]
    /// records. `default_ttl_seconds` applies when `set_url` gets a TTL of 0
    /// and is at least one second.
    pub fn new(default_ttl_seconds: u64) -> Self {
        Self::with_capacity(default_ttl_seconds, DEFAULT_MEMORY_CACHE_CAPACITY)
    }

    /// Creates an empty cache holding up to `max_capacity` records.
    pub fn with_capacity(default_ttl_seconds: u64, max_capacity: u64) -> Self {
        let urls = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerRecordTtl)
            .build();

        Self {
            default_ttl: default_ttl_seconds.max(1),
            urls,
            clicks: Arc::new(DashMap::new()),
        }
    }

    /// Number of cached records after expired ones have been evicted.
    pub async fn len(&self) -> u64 {
        self.urls.run_pending_tasks().await;
        self.urls.entry_count()
    }

    /// Returns true if no record is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<UrlRecord>> {
        match self.urls.get(short_code).await {
            Some(cached) => {
                debug!(short_code, "Cache HIT");
                Ok(Some(cached.record))
            }
            None => {
                debug!(short_code, "Cache MISS");
                Ok(None)
            }
        }
    }

    async fn set_url(&self, record: &UrlRecord, ttl_seconds: u64) -> CacheResult<()> {
        let ttl = effective_ttl(ttl_seconds, self.default_ttl);

        self.urls
            .insert(
                record.short_code.clone(),
                CachedRecord {
                    record: record.clone(),
                    ttl: Duration::from_secs(ttl),
                },
            )
            .await;

        trace!(short_code = %record.short_code, ttl, "Cache SET");
        Ok(())
    }

    async fn delete_url(&self, short_code: &str) -> CacheResult<()> {
        self.urls.invalidate(short_code).await;
        Ok(())
    }

    async fn increment_click_count(&self, short_code: &str) -> CacheResult<()> {
        *self.clicks.entry(short_code.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn get_click_count(&self, short_code: &str) -> CacheResult<i64> {
        Ok(self.clicks.get(short_code).map(|count| *count).unwrap_or(0))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
