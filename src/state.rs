//! Shared application state injected into every handler.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::application::background::{BackgroundTasks, DEFAULT_BACKGROUND_TASK_LIMIT};
use crate::application::services::{
    CachedUrlService, DEFAULT_CACHE_TTL_SECONDS, DefaultUrlService, UrlService,
};
use crate::config::Config;
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{Base62Generator, DEFAULT_CODE_LENGTH};

/// Knobs for assembling the URL service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub base_url: String,
    pub short_code_length: usize,
    pub cache_ttl_seconds: u64,
    pub background_task_limit: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            short_code_length: DEFAULT_CODE_LENGTH,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            background_task_limit: DEFAULT_BACKGROUND_TASK_LIMIT,
        }
    }
}

impl From<&Config> for ServiceOptions {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            short_code_length: config.short_code_length,
            cache_ttl_seconds: config.cache_ttl_seconds,
            background_task_limit: config.background_task_limit,
        }
    }
}

/// Handles shared by all requests. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<dyn UrlService>,
    pub repository: Arc<dyn UrlRepository>,
    pub cache: Option<Arc<dyn CacheService>>,
    pub background: BackgroundTasks,
    pub base_url: String,
    /// Renders recorded metrics; `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires the shortening pipeline over a store and an optional cache.
    ///
    /// Without a cache the store-backed service is used directly; with one it
    /// is wrapped in [`CachedUrlService`].
    pub fn build<R>(
        repository: Arc<R>,
        cache: Option<Arc<dyn CacheService>>,
        options: ServiceOptions,
    ) -> Self
    where
        R: UrlRepository + 'static,
    {
        let background = BackgroundTasks::new(options.background_task_limit);
        let generator = Arc::new(Base62Generator::new(options.short_code_length));

        let core = DefaultUrlService::new(Arc::clone(&repository), generator, background.clone());

        let url_service: Arc<dyn UrlService> = match &cache {
            Some(cache) => Arc::new(
                CachedUrlService::new(
                    core,
                    Arc::clone(&repository),
                    Some(Arc::clone(cache)),
                    background.clone(),
                )
                .with_ttl(options.cache_ttl_seconds),
            ),
            None => Arc::new(core),
        };

        Self {
            url_service,
            repository,
            cache,
            background,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            metrics: None,
        }
    }

    /// Exposes `handle` on the metrics endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Public URL for a short code.
    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }
}
