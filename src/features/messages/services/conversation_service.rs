use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::messages::dtos::{ConversationResponseDto, RebuildResponseDto};
use crate::features::messages::models::fold_conversations;
use crate::features::messages::repositories::MessageRepository;
use crate::features::users::UserService;

/// Reads and rebuilds per-user conversation summaries
pub struct ConversationService {
    repository: Arc<dyn MessageRepository>,
    users: Arc<UserService>,
}

impl ConversationService {
    pub fn new(repository: Arc<dyn MessageRepository>, users: Arc<UserService>) -> Self {
        Self { repository, users }
    }

    /// The user's conversations, most recent first
    pub async fn list(&self, user_id: &str) -> Result<Vec<ConversationResponseDto>> {
        let summaries = self.repository.list_conversations(user_id).await?;
        Ok(summaries.into_iter().map(Into::into).collect())
    }

    /// Recompute a user's summaries from full history and replace the stored rows
    pub async fn rebuild(&self, user_id: &str) -> Result<RebuildResponseDto> {
        if self.users.find(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let history = self.repository.direct_history(user_id).await?;
        let summaries = fold_conversations(user_id, &history);
        self.repository
            .replace_conversations(user_id, &summaries)
            .await?;

        tracing::info!(
            "Rebuilt {} conversation summaries for user {} from {} messages",
            summaries.len(),
            user_id,
            history.len()
        );

        Ok(RebuildResponseDto {
            user_id: user_id.to_string(),
            conversations: summaries.len(),
        })
    }
}
