use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::uploads::models::UploadAsset;

#[async_trait]
pub trait UploadRepository: Send + Sync {
    /// Atomically mark the asset claimed.
    ///
    /// Returns `None` when the token is unknown, owned by someone else,
    /// expired, larger than `max_size` or already claimed. An asset that is
    /// not returned stays unclaimed.
    async fn claim(
        &self,
        token_id: Uuid,
        uploader_id: &str,
        now: DateTime<Utc>,
        max_size: i64,
    ) -> Result<Option<UploadAsset>>;

    /// Undo a claim whose message was never stored
    async fn release(&self, token_id: Uuid, uploader_id: &str) -> Result<bool>;
}

pub struct PgUploadRepository {
    pool: PgPool,
}

impl PgUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadRepository for PgUploadRepository {
    async fn claim(
        &self,
        token_id: Uuid,
        uploader_id: &str,
        now: DateTime<Utc>,
        max_size: i64,
    ) -> Result<Option<UploadAsset>> {
        let asset = sqlx::query_as::<_, UploadAsset>(
            r#"
            UPDATE uploads
            SET claimed = TRUE
            WHERE token_id = $1
              AND uploaded_by = $2
              AND claimed = FALSE
              AND expires_at > $3
              AND size <= $4
            RETURNING token_id, uploaded_by, original_name, storage_path, mime_type,
                      size, upload_type, claimed, created_at, expires_at
            "#,
        )
        .bind(token_id)
        .bind(uploader_id)
        .bind(now)
        .bind(max_size)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }

    async fn release(&self, token_id: Uuid, uploader_id: &str) -> Result<bool> {
        let released = sqlx::query(
            r#"
            UPDATE uploads
            SET claimed = FALSE
            WHERE token_id = $1 AND uploaded_by = $2 AND claimed = TRUE
            "#,
        )
        .bind(token_id)
        .bind(uploader_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(released > 0)
    }
}
