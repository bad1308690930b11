//! In-process implementation of the URL store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::domain::entities::UrlRecord;
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;

/// Store held in process memory, keyed by short code.
///
/// Behaves like [`super::PgUrlRepository`] for every trait operation,
/// including rejecting duplicate short codes. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryUrlRepository {
    records: DashMap<String, UrlRecord>,
}

impl MemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn save(&self, record: &UrlRecord) -> Result<(), AppError> {
        // Check and insert under the shard lock.
        match self.records.entry(record.short_code.clone()) {
            Entry::Occupied(_) => Err(AppError::ShortCodeTaken),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        Ok(self
            .records
            .get(short_code)
            .map(|record| record.value().clone()))
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, AppError> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.original_url == original_url)
            .min_by_key(|record| record.created_at)
            .map(|record| record.value().clone()))
    }

    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        Ok(self.records.contains_key(short_code))
    }

    async fn increment_click_count(&self, short_code: &str) -> Result<(), AppError> {
        if let Some(mut record) = self.records.get_mut(short_code) {
            record.click_count += 1;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
