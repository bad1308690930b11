//! Short link creation and redirect resolution.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::background::BackgroundTasks;
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::utils::code_generator::CodeGenerator;
use crate::utils::url_validator::validate_url;

/// Maximum number of candidates tried before giving up on a unique code.
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// The two operations exposed to the HTTP layer.
///
/// Implemented by [`DefaultUrlService`] and by the caching decorator
/// [`crate::application::services::CachedUrlService`], so a cache can be
/// swapped in or out at construction time without touching callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlService: Send + Sync {
    /// Returns the record for `original_url`, creating it if needed.
    async fn shorten_url(&self, original_url: &str) -> Result<UrlRecord, AppError>;

    /// Resolves a short code to its original URL.
    async fn redirect(&self, short_code: &str) -> Result<String, AppError>;
}

/// Store-backed URL service.
///
/// Handles validation, deduplication by original URL, unique code generation
/// with collision retry, and asynchronous click accounting.
pub struct DefaultUrlService<R: UrlRepository, G: CodeGenerator> {
    repository: Arc<R>,
    generator: Arc<G>,
    background: BackgroundTasks,
}

impl<R, G> DefaultUrlService<R, G>
where
    R: UrlRepository + 'static,
    G: CodeGenerator,
{
    /// Creates a new URL service.
    pub fn new(repository: Arc<R>, generator: Arc<G>, background: BackgroundTasks) -> Self {
        Self {
            repository,
            generator,
            background,
        }
    }

    /// Generates a code not yet present in the store.
    ///
    /// Only collisions are retried. A failing existence check aborts at once.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CodeSpaceExhausted`] after
    /// [`MAX_GENERATION_ATTEMPTS`] collisions.
    async fn generate_unique_code(&self) -> Result<String, AppError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = self.generator.generate();

            let taken = self
                .repository
                .exists(&candidate)
                .await
                .map_err(|e| e.context("failed to check short code"))?;

            if !taken {
                return Ok(candidate);
            }

            debug!(attempt, short_code = %candidate, "Short code collision");
        }

        warn!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "Short code space exhausted, consider a longer code length"
        );

        Err(AppError::CodeSpaceExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }
}

#[async_trait]
impl<R, G> UrlService for DefaultUrlService<R, G>
where
    R: UrlRepository + 'static,
    G: CodeGenerator,
{
    /// Shortens a URL.
    ///
    /// # Deduplication
    ///
    /// If a record for the exact same original URL exists, it is returned
    /// unchanged and no new code is minted.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUrl`] if the URL is not an absolute http(s) URL
    /// - [`AppError::CodeSpaceExhausted`] if every candidate collided
    /// - [`AppError::ShortCodeTaken`] if a concurrent writer won the code
    /// - [`AppError::Persistence`] on store errors
    async fn shorten_url(&self, original_url: &str) -> Result<UrlRecord, AppError> {
        if let Err(e) = validate_url(original_url) {
            debug!(reason = %e, "Rejected URL");
            return Err(AppError::InvalidUrl);
        }

        if let Some(existing) = self
            .repository
            .find_by_original_url(original_url)
            .await
            .map_err(|e| e.context("failed to look up original URL"))?
        {
            debug!(short_code = %existing.short_code, "URL already shortened");
            return Ok(existing);
        }

        let short_code = self.generate_unique_code().await?;
        let record = UrlRecord::new(original_url.to_string(), short_code)?;

        self.repository
            .save(&record)
            .await
            .map_err(|e| e.context("failed to save URL"))?;

        info!(short_code = %record.short_code, "Created short link");

        Ok(record)
    }

    /// Resolves a short code and schedules a store click increment.
    ///
    /// The increment runs in the background; its outcome never affects the
    /// returned URL.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidShortCode`] if the code is malformed (the store is not queried)
    /// - [`AppError::UrlNotFound`] if no record matches
    /// - [`AppError::Persistence`] on store errors
    async fn redirect(&self, short_code: &str) -> Result<String, AppError> {
        if !self.generator.validate(short_code) {
            return Err(AppError::InvalidShortCode);
        }

        let record = self
            .repository
            .find_by_code(short_code)
            .await
            .map_err(|e| e.context("failed to look up short code"))?
            .ok_or(AppError::UrlNotFound)?;

        let repository = Arc::clone(&self.repository);
        let code = record.short_code.clone();
        self.background.spawn("store_click_increment", async move {
            if let Err(e) = repository.increment_click_count(&code).await {
                warn!(short_code = %code, error = %e, "Failed to increment click count");
            }
        });

        Ok(record.original_url)
    }
}
