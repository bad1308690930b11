//! Read-through caching decorator for [`UrlService`].

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::background::BackgroundTasks;
use crate::application::services::url_service::UrlService;
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// TTL for records written to the cache on a redirect miss.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

/// Wraps a [`UrlService`] with a cache-aside redirect path.
///
/// # Cache Strategy
///
/// - **Shorten**: delegated verbatim, the cache is neither read nor written
/// - **Cache hit**: return the cached URL, bump the cache-side click counter in the background
/// - **Cache miss or cache error**: delegate to the wrapped service, then
///   re-read the record from the store and cache it in the background
///
/// The cache never fails a request. Records are immutable once created, so a
/// stale entry can only carry a stale `click_count`.
///
/// # Click Counters
///
/// A redirect served from the cache increments only the cache counter; one
/// served by the wrapped service increments only the store counter. The two
/// counters are independent and never merged.
pub struct CachedUrlService<S: UrlService, R: UrlRepository> {
    inner: S,
    repository: Arc<R>,
    cache: Option<Arc<dyn CacheService>>,
    background: BackgroundTasks,
    ttl_seconds: u64,
}

impl<S, R> CachedUrlService<S, R>
where
    S: UrlService,
    R: UrlRepository + 'static,
{
    /// Creates the decorator. With `cache = None` every call is delegated.
    pub fn new(
        inner: S,
        repository: Arc<R>,
        cache: Option<Arc<dyn CacheService>>,
        background: BackgroundTasks,
    ) -> Self {
        Self {
            inner,
            repository,
            cache,
            background,
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }

    /// Overrides the TTL used when populating the cache.
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Looks up the cache, treating errors as misses.
    async fn cached_record(&self, cache: &dyn CacheService, short_code: &str) -> Option<UrlRecord> {
        match cache.get_url(short_code).await {
            Ok(Some(record)) => {
                counter!("cache_hits_total").increment(1);
                Some(record)
            }
            Ok(None) => {
                counter!("cache_misses_total").increment(1);
                None
            }
            Err(e) => {
                counter!("cache_errors_total").increment(1);
                warn!(short_code, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    fn schedule_click_increment(&self, cache: &Arc<dyn CacheService>, short_code: &str) {
        let cache = Arc::clone(cache);
        let code = short_code.to_string();

        self.background.spawn("cache_click_increment", async move {
            if let Err(e) = cache.increment_click_count(&code).await {
                warn!(short_code = %code, error = %e, "Failed to increment cached click count");
            }
        });
    }

    fn schedule_population(&self, cache: &Arc<dyn CacheService>, short_code: &str) {
        let cache = Arc::clone(cache);
        let repository = Arc::clone(&self.repository);
        let code = short_code.to_string();
        let ttl = self.ttl_seconds;

        self.background.spawn("cache_population", async move {
            let record = match repository.find_by_code(&code).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    warn!(short_code = %code, "Record disappeared before caching");
                    return;
                }
                Err(e) => {
                    warn!(short_code = %code, error = %e, "Failed to load URL for caching");
                    return;
                }
            };

            match cache.set_url(&record, ttl).await {
                Ok(()) => debug!(short_code = %code, ttl, "Cached URL"),
                Err(e) => warn!(short_code = %code, error = %e, "Failed to cache URL"),
            }
        });
    }
}

#[async_trait]
impl<S, R> UrlService for CachedUrlService<S, R>
where
    S: UrlService,
    R: UrlRepository + 'static,
{
    async fn shorten_url(&self, original_url: &str) -> Result<UrlRecord, AppError> {
        self.inner.shorten_url(original_url).await
    }

    async fn redirect(&self, short_code: &str) -> Result<String, AppError> {
        if let Some(cache) = &self.cache
            && let Some(record) = self.cached_record(cache.as_ref(), short_code).await
        {
            self.schedule_click_increment(cache, short_code);
            return Ok(record.original_url);
        }

        let original_url = self.inner.redirect(short_code).await?;

        if let Some(cache) = &self.cache {
            self.schedule_population(cache, short_code);
        }

        Ok(original_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::url_service::MockUrlService;
    use crate::domain::repositories::MockUrlRepository;
    use crate::infrastructure::cache::{CacheError, MockCacheService};
    use mockall::predicate::eq;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn create_test_record(code: &str, url: &str) -> UrlRecord {
        UrlRecord::new(url.to_string(), code.to_string()).unwrap()
    }

    fn cached_service(
        inner: MockUrlService,
        repo: MockUrlRepository,
        cache: Option<MockCacheService>,
    ) -> CachedUrlService<MockUrlService, MockUrlRepository> {
        let cache = cache.map(|c| Arc::new(c) as Arc<dyn CacheService>);
        CachedUrlService::new(inner, Arc::new(repo), cache, BackgroundTasks::new(16))
    }

    #[tokio::test]
    async fn test_shorten_delegates_without_touching_cache() {
        let mut inner = MockUrlService::new();
        let record = create_test_record("abc123", "https://example.com");
        let expected = record.clone();
        inner
            .expect_shorten_url()
            .with(eq("https://example.com"))
            .times(1)
            .returning(move |_| Ok(record.clone()));

        let mut cache = MockCacheService::new();
        cache.expect_set_url().times(0);
        cache.expect_get_url().times(0);

        let service = cached_service(inner, MockUrlRepository::new(), Some(cache));

        let result = service.shorten_url("https://example.com").await.unwrap();
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_shorten_propagates_inner_error() {
        let mut inner = MockUrlService::new();
        inner
            .expect_shorten_url()
            .returning(|_| Err(AppError::InvalidUrl));

        let service = cached_service(inner, MockUrlRepository::new(), None);

        let result = service.shorten_url("ftp://example.com").await;
        assert!(matches!(result, Err(AppError::InvalidUrl)));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store_and_counts_in_cache() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut inner = MockUrlService::new();
        inner.expect_redirect().times(0);

        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_code().times(0);
        repo.expect_increment_click_count().times(0);

        let mut cache = MockCacheService::new();
        let record = create_test_record("abc123", "https://cached.example.com");
        cache
            .expect_get_url()
            .with(eq("abc123"))
            .times(1)
            .returning(move |_| Ok(Some(record.clone())));
        cache
            .expect_increment_click_count()
            .with(eq("abc123"))
            .times(1)
            .returning(move |code| {
                let _ = tx.send(code.to_string());
                Ok(())
            });
        cache.expect_set_url().times(0);

        let service = cached_service(inner, repo, Some(cache));

        let url = service.redirect("abc123").await.unwrap();
        assert_eq!(url, "https://cached.example.com");

        let counted = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(counted.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_cache_miss_delegates_and_populates() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut inner = MockUrlService::new();
        inner
            .expect_redirect()
            .with(eq("abc123"))
            .times(1)
            .returning(|_| Ok("https://example.com".to_string()));

        let mut repo = MockUrlRepository::new();
        let record = create_test_record("abc123", "https://example.com");
        repo.expect_find_by_code()
            .with(eq("abc123"))
            .times(1)
            .returning(move |_| Ok(Some(record.clone())));

        let mut cache = MockCacheService::new();
        cache.expect_get_url().times(1).returning(|_| Ok(None));
        cache
            .expect_set_url()
            .withf(|record, ttl| record.short_code == "abc123" && *ttl == 3600)
            .times(1)
            .returning(move |record, ttl| {
                let _ = tx.send((record.short_code.clone(), ttl));
                Ok(())
            });
        cache.expect_increment_click_count().times(0);

        let service = cached_service(inner, repo, Some(cache));

        let url = service.redirect("abc123").await.unwrap();
        assert_eq!(url, "https://example.com");

        let populated = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("cache was not populated");
        assert_eq!(populated, Some(("abc123".to_string(), 3600)));
    }

    #[tokio::test]
    async fn test_population_uses_configured_ttl() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut inner = MockUrlService::new();
        inner
            .expect_redirect()
            .returning(|_| Ok("https://example.com".to_string()));

        let mut repo = MockUrlRepository::new();
        let record = create_test_record("abc123", "https://example.com");
        repo.expect_find_by_code()
            .returning(move |_| Ok(Some(record.clone())));

        let mut cache = MockCacheService::new();
        cache.expect_get_url().returning(|_| Ok(None));
        cache.expect_set_url().returning(move |_, ttl| {
            let _ = tx.send(ttl);
            Ok(())
        });

        let service = cached_service(inner, repo, Some(cache)).with_ttl(120);

        service.redirect("abc123").await.unwrap();

        let ttl = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(ttl, Some(120));
    }

    #[tokio::test]
    async fn test_cache_errors_fail_open() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut inner = MockUrlService::new();
        inner
            .expect_redirect()
            .times(1)
            .returning(|_| Ok("https://example.com".to_string()));

        let mut repo = MockUrlRepository::new();
        let record = create_test_record("abc123", "https://example.com");
        repo.expect_find_by_code()
            .returning(move |_| Ok(Some(record.clone())));

        let mut cache = MockCacheService::new();
        cache.expect_get_url().returning(|_| {
            Err(CacheError::ConnectionError("connection refused".to_string()))
        });
        cache.expect_set_url().returning(move |_, _| {
            let _ = tx.send(());
            Err(CacheError::OperationError("READONLY".to_string()))
        });

        let service = cached_service(inner, repo, Some(cache));

        let url = service.redirect("abc123").await.unwrap();
        assert_eq!(url, "https://example.com");

        timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    }

    #[tokio::test]
    async fn test_population_lookup_failure_is_swallowed() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut inner = MockUrlService::new();
        inner
            .expect_redirect()
            .returning(|_| Ok("https://example.com".to_string()));

        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_code().times(1).returning(move |_| {
            let _ = tx.send(());
            Err(AppError::persistence("select", "connection reset"))
        });

        let mut cache = MockCacheService::new();
        cache.expect_get_url().returning(|_| Ok(None));
        cache.expect_set_url().times(0);

        let service = cached_service(inner, repo, Some(cache));

        assert_eq!(
            service.redirect("abc123").await.unwrap(),
            "https://example.com"
        );
        timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    }

    #[tokio::test]
    async fn test_inner_error_propagates_without_population() {
        let mut inner = MockUrlService::new();
        inner
            .expect_redirect()
            .times(1)
            .returning(|_| Err(AppError::UrlNotFound));

        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_code().times(0);

        let mut cache = MockCacheService::new();
        cache.expect_get_url().returning(|_| Ok(None));
        cache.expect_set_url().times(0);

        let service = cached_service(inner, repo, Some(cache));

        let result = service.redirect("zzzzzz").await;
        assert!(matches!(result, Err(AppError::UrlNotFound)));

        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn test_without_cache_delegates_everything() {
        let mut inner = MockUrlService::new();
        inner
            .expect_redirect()
            .times(1)
            .returning(|_| Ok("https://example.com".to_string()));

        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_code().times(0);

        let service = cached_service(inner, repo, None);

        assert_eq!(
            service.redirect("abc123").await.unwrap(),
            "https://example.com"
        );
    }
}
