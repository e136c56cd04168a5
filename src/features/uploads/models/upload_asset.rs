use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a stored upload, written by the upload service
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct UploadAsset {
    pub token_id: Uuid,
    pub uploaded_by: String,
    pub original_name: String,
    /// Path relative to the public uploads base URL
    pub storage_path: String,
    pub mime_type: String,
    pub size: i64,
    pub upload_type: String,
    pub claimed: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
