//! PostgreSQL implementation of the URL store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::UrlRecord;
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct UrlRow {
    id: Uuid,
    original_url: String,
    short_code: String,
    created_at: DateTime<Utc>,
    click_count: i64,
}

impl From<UrlRow> for UrlRecord {
    fn from(row: UrlRow) -> Self {
        Self {
            id: row.id,
            original_url: row.original_url,
            short_code: row.short_code,
            created_at: row.created_at,
            click_count: row.click_count,
        }
    }
}

/// PostgreSQL repository for the `urls` table.
///
/// Short code uniqueness is enforced by the `urls_short_code_key` constraint;
/// a violation surfaces as [`AppError::ShortCodeTaken`].
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn save(&self, record: &UrlRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO urls (id, original_url, short_code, created_at, click_count)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(&record.original_url)
        .bind(&record.short_code)
        .bind(record.created_at)
        .bind(record.click_count)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| AppError::from(e).context("insert url"))?;

        Ok(())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(
            r#"
            SELECT id, original_url, short_code, created_at, click_count
            FROM urls
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| AppError::from(e).context("select url by code"))?;

        Ok(row.map(UrlRecord::from))
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(
            r#"
            SELECT id, original_url, short_code, created_at, click_count
            FROM urls
            WHERE original_url = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| AppError::from(e).context("select url by original url"))?;

        Ok(row.map(UrlRecord::from))
    }

    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM urls WHERE short_code = $1)",
        )
        .bind(short_code)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| AppError::from(e).context("check short code"))?;

        Ok(exists)
    }

    async fn increment_click_count(&self, short_code: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE urls SET click_count = click_count + 1 WHERE short_code = $1")
            .bind(short_code)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| AppError::from(e).context("increment click count"))?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| AppError::from(e).context("ping"))?;

        Ok(())
    }
}
