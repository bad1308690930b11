#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo};
use axum_test::TestServer;
use snaplink::api;
use snaplink::domain::entities::UrlRecord;
use snaplink::domain::repositories::UrlRepository;
use snaplink::error::AppError;
use snaplink::infrastructure::cache::{CacheError, CacheResult, CacheService, MemoryCache};
use snaplink::infrastructure::persistence::MemoryUrlRepository;
use snaplink::state::{AppState, ServiceOptions};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;

pub const BASE_URL: &str = "http://sho.rt";

pub fn test_options() -> ServiceOptions {
    ServiceOptions {
        base_url: BASE_URL.to_string(),
        background_task_limit: 64,
        ..ServiceOptions::default()
    }
}

/// State over an in-memory store without a cache.
pub fn uncached_state() -> (AppState, Arc<MemoryUrlRepository>) {
    let repo = Arc::new(MemoryUrlRepository::new());
    let state = AppState::build(Arc::clone(&repo), None, test_options());
    (state, repo)
}

/// State over an in-memory store and an in-memory cache.
pub fn cached_state() -> (AppState, Arc<MemoryUrlRepository>, Arc<MemoryCache>) {
    let repo = Arc::new(MemoryUrlRepository::new());
    let cache = Arc::new(MemoryCache::new(60));
    let state = AppState::build(
        Arc::clone(&repo),
        Some(Arc::clone(&cache) as Arc<dyn CacheService>),
        test_options(),
    );
    (state, repo, cache)
}

/// State whose cache fails every operation.
pub fn broken_cache_state() -> (AppState, Arc<MemoryUrlRepository>) {
    let repo = Arc::new(MemoryUrlRepository::new());
    let cache: Arc<dyn CacheService> = Arc::new(FailingCache);
    let state = AppState::build(Arc::clone(&repo), Some(cache), test_options());
    (state, repo)
}

/// Full API router (rate limiting and tracing included) behind a fake peer address.
pub fn test_server(state: AppState) -> TestServer {
    let app: Router = api::routes::router(state, false).layer(MockConnectInfoLayer);
    TestServer::new(app).unwrap()
}

/// Polls `check` until it returns true or one second passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Cache that is permanently unreachable.
pub struct FailingCache;

fn unreachable() -> CacheError {
    CacheError::ConnectionError("connection refused".to_string())
}

#[async_trait]
impl CacheService for FailingCache {
    async fn get_url(&self, _short_code: &str) -> CacheResult<Option<UrlRecord>> {
        Err(unreachable())
    }

    async fn set_url(&self, _record: &UrlRecord, _ttl_seconds: u64) -> CacheResult<()> {
        Err(unreachable())
    }

    async fn delete_url(&self, _short_code: &str) -> CacheResult<()> {
        Err(unreachable())
    }

    async fn increment_click_count(&self, _short_code: &str) -> CacheResult<()> {
        Err(unreachable())
    }

    async fn get_click_count(&self, _short_code: &str) -> CacheResult<i64> {
        Err(unreachable())
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Store whose database is down.
pub struct UnreachableStore;

fn store_down() -> AppError {
    AppError::persistence("test store", "connection refused")
}

#[async_trait]
impl UrlRepository for UnreachableStore {
    async fn save(&self, _record: &UrlRecord) -> Result<(), AppError> {
        Err(store_down())
    }

    async fn find_by_code(&self, _short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        Err(store_down())
    }

    async fn find_by_original_url(
        &self,
        _original_url: &str,
    ) -> Result<Option<UrlRecord>, AppError> {
        Err(store_down())
    }

    async fn exists(&self, _short_code: &str) -> Result<bool, AppError> {
        Err(store_down())
    }

    async fn increment_click_count(&self, _short_code: &str) -> Result<(), AppError> {
        Err(store_down())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(store_down())
    }
}

/// In-memory store whose click increments take `delay`.
pub struct SlowClickStore {
    inner: Arc<MemoryUrlRepository>,
    delay: Duration,
}

impl SlowClickStore {
    pub fn new(inner: Arc<MemoryUrlRepository>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl UrlRepository for SlowClickStore {
    async fn save(&self, record: &UrlRecord) -> Result<(), AppError> {
        self.inner.save(record).await
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        self.inner.find_by_code(short_code).await
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, AppError> {
        self.inner.find_by_original_url(original_url).await
    }

    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        self.inner.exists(short_code).await
    }

    async fn increment_click_count(&self, short_code: &str) -> Result<(), AppError> {
        tokio::time::sleep(self.delay).await;
        self.inner.increment_click_count(short_code).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }
}

/// In-memory cache whose record writes take `delay`.
pub struct SlowWriteCache {
    inner: Arc<MemoryCache>,
    delay: Duration,
}

impl SlowWriteCache {
    pub fn new(inner: Arc<MemoryCache>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl CacheService for SlowWriteCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<UrlRecord>> {
        self.inner.get_url(short_code).await
    }

    async fn set_url(&self, record: &UrlRecord, ttl_seconds: u64) -> CacheResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.set_url(record, ttl_seconds).await
    }

    async fn delete_url(&self, short_code: &str) -> CacheResult<()> {
        self.inner.delete_url(short_code).await
    }

    async fn increment_click_count(&self, short_code: &str) -> CacheResult<()> {
        self.inner.increment_click_count(short_code).await
    }

    async fn get_click_count(&self, short_code: &str) -> CacheResult<i64> {
        self.inner.get_click_count(short_code).await
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
