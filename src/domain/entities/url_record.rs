//! URL record entity: the mapping from a short code to its original URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A shortened URL.
///
/// Every field except `click_count` is fixed once the record is created.
/// `click_count` only grows, through best-effort increments after redirects.
///
/// The record is also the cache payload, hence the serde derives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: Uuid,
    pub original_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub click_count: i64,
}

impl UrlRecord {
    /// Creates a fresh record with a new id, the current time and zero clicks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidUrl`] if `original_url` is empty and
    /// [`AppError::InvalidShortCode`] if `short_code` is empty.
    pub fn new(original_url: String, short_code: String) -> Result<Self, AppError> {
        if original_url.is_empty() {
            return Err(AppError::InvalidUrl);
        }
        if short_code.is_empty() {
            return Err(AppError::InvalidShortCode);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            original_url,
            short_code,
            created_at: Utc::now(),
            click_count: 0,
        })
    }
}
