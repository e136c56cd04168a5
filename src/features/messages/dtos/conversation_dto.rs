use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::messages::models::ConversationSummary;
use crate::features::users::models::Role;

/// One entry of the caller's conversation list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponseDto {
    pub counterpart_id: String,
    pub counterpart_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterpart_role: Option<Role>,
    pub last_message_id: Uuid,
    /// Content of the latest message, or "Sent a file: {filename}"
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    /// Unread messages from the counterpart to the caller
    pub unread_count: i64,
}

impl From<ConversationSummary> for ConversationResponseDto {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            counterpart_id: summary.counterpart_id,
            counterpart_name: summary.counterpart_name,
            counterpart_role: summary.counterpart_role,
            last_message_id: summary.last_message_id,
            last_message: summary.last_message,
            last_message_at: summary.last_message_at,
            unread_count: summary.unread_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RebuildResponseDto {
    pub user_id: String,
    /// Number of summaries written
    pub conversations: usize,
}
