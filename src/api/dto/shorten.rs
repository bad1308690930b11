//! DTOs for link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::UrlRecord;

/// Request to shorten a URL.
///
/// Only the length is checked here; scheme and host rules are enforced by
/// the service so that every caller gets the same validation.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1 to 2048 characters"))]
    pub url: String,
}

/// A created (or previously created) short link.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_url: String,
    pub original_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
}

impl ShortenResponse {
    pub fn from_record(record: UrlRecord, short_url: String) -> Self {
        Self {
            short_url,
            original_url: record.original_url,
            short_code: record.short_code,
            created_at: record.created_at,
        }
    }
}
