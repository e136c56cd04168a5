use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::config::UploadsConfig;
use crate::core::error::{AppError, Result};
use crate::features::messages::models::Attachment;
use crate::features::uploads::models::UploadAsset;
use crate::features::uploads::repositories::UploadRepository;

/// Turns upload tokens into message attachments
pub struct UploadService {
    repository: Arc<dyn UploadRepository>,
    config: UploadsConfig,
}

impl UploadService {
    pub fn new(repository: Arc<dyn UploadRepository>, config: UploadsConfig) -> Self {
        Self { repository, config }
    }

    pub fn max_attachment_size(&self) -> i64 {
        self.config.max_attachment_size
    }

    /// Public URL of a stored asset
    pub fn public_url(&self, asset: &UploadAsset) -> String {
        format!(
            "{}/{}",
            self.config.public_base_url,
            asset.storage_path.trim_start_matches('/')
        )
    }

    /// Claim an upload token on behalf of `uploader_id`.
    ///
    /// A token can be claimed once, by its uploader, before it expires, and
    /// only for an asset within the attachment size limit.
    pub async fn claim_attachment(&self, token: Uuid, uploader_id: &str) -> Result<Attachment> {
        let asset = self
            .repository
            .claim(token, uploader_id, Utc::now(), self.config.max_attachment_size)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    "Rejected upload token {} for user {}: unknown, expired, oversized or already used",
                    token,
                    uploader_id
                );
                AppError::Validation(format!(
                    "Upload token is invalid, already used or exceeds the maximum size of {} bytes",
                    self.config.max_attachment_size
                ))
            })?;

        tracing::debug!("User {} claimed upload {}", uploader_id, token);

        Ok(Attachment {
            url: self.public_url(&asset),
            filename: asset.original_name,
            size: asset.size,
            mime_type: asset.mime_type,
        })
    }

    /// Make a claimed token usable again after its message failed to store
    pub async fn release_attachment(&self, token: Uuid, uploader_id: &str) -> Result<()> {
        if self.repository.release(token, uploader_id).await? {
            tracing::debug!("Released upload {} for user {}", token, uploader_id);
        }
        Ok(())
    }
}
