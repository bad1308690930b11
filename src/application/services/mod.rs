//! Business logic services for the application layer.

pub mod cached_url_service;
pub mod url_service;

pub use cached_url_service::{CachedUrlService, DEFAULT_CACHE_TTL_SECONDS};
pub use url_service::{DefaultUrlService, MAX_GENERATION_ATTEMPTS, UrlService};

#[cfg(test)]
pub use url_service::MockUrlService;
