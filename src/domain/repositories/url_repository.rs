//! Repository trait for the persistent URL store.

use crate::domain::entities::UrlRecord;
use crate::error::AppError;
use async_trait::async_trait;

/// Durable mapping from short code to [`UrlRecord`].
///
/// The store is the single source of truth. Short code uniqueness is
/// enforced here, not by callers: [`UrlRepository::save`] reports a lost race
/// as [`AppError::ShortCodeTaken`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Persists a new record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ShortCodeTaken`] if the short code already exists.
    /// Returns [`AppError::Persistence`] on storage errors.
    async fn save(&self, record: &UrlRecord) -> Result<(), AppError>;

    /// Finds a record by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UrlRecord))` if found
    /// - `Ok(None)` if not found
    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError>;

    /// Finds a record by exact original URL match.
    ///
    /// Used to make shortening idempotent.
    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, AppError>;

    /// Returns true if a record with this short code exists.
    async fn exists(&self, short_code: &str) -> Result<bool, AppError>;

    /// Atomically adds one to the record's click count.
    ///
    /// Incrementing an unknown code is not an error.
    async fn increment_click_count(&self, short_code: &str) -> Result<(), AppError>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}
