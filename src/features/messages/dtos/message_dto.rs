use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::messages::models::{Attachment, Message};
use crate::features::users::models::Role;

/// Explicit attachment descriptor supplied by the client
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInputDto {
    #[validate(url(message = "Attachment url must be a valid URL"))]
    pub url: String,

    #[validate(length(min = 1, max = 255, message = "Filename must be 1-255 characters"))]
    pub filename: String,

    /// Size in bytes
    #[validate(range(min = 0, message = "Size must not be negative"))]
    pub size: i64,

    #[serde(alias = "type")]
    #[validate(length(min = 1, max = 255, message = "mimeType must be 1-255 characters"))]
    pub mime_type: String,
}

impl From<AttachmentInputDto> for Attachment {
    fn from(dto: AttachmentInputDto) -> Self {
        Self {
            url: dto.url,
            filename: dto.filename,
            size: dto.size,
            mime_type: dto.mime_type,
        }
    }
}

/// Request DTO for sending a message.
///
/// Without `receiverId` the message is posted to the group feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageDto {
    #[serde(default)]
    pub content: String,

    #[validate(regex(
        path = "*crate::shared::validation::USER_ID_REGEX",
        message = "receiverId is not a valid user id"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,

    #[validate(nested)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentInputDto>,

    /// Token of a previous upload; mutually exclusive with `attachment`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_token: Option<Uuid>,
}

/// Which slice of history to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageScope {
    /// Shared feed
    Group,
    /// Everything the caller sent or received
    Mine,
}

/// Query parameters for listing messages
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListMessagesQuery {
    /// `group` (default) or `mine`; cannot be combined with `partnerId`
    pub scope: Option<MessageScope>,

    /// Thread between the caller and this user, both directions
    #[serde(alias = "userId")]
    #[validate(regex(
        path = "*crate::shared::validation::USER_ID_REGEX",
        message = "partnerId is not a valid user id"
    ))]
    pub partner_id: Option<String>,

    /// Only messages strictly older than this instant (RFC 3339)
    pub before: Option<DateTime<Utc>>,

    /// Id of the row at `before`; rows sharing its timestamp with a smaller id are kept
    pub before_id: Option<Uuid>,

    /// Only messages strictly newer than this instant (RFC 3339), oldest first.
    ///
    /// Rows are stamped when inserted, so a send committing late can carry an
    /// earlier stamp than rows already seen. Pollers that must not miss one
    /// re-read with a bare `after` a few seconds back and drop ids they have.
    pub after: Option<DateTime<Utc>>,

    /// Id of the row at `after`; rows sharing its timestamp with a larger id are kept
    pub after_id: Option<Uuid>,

    /// Page size (default: 100, max: 500)
    #[param(minimum = 1, maximum = 500)]
    pub limit: Option<i64>,
}

/// Response DTO for a stored message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponseDto {
    pub id: Uuid,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_role: Option<Role>,
    pub is_group_message: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponseDto {
    fn from(message: Message) -> Self {
        let attachment = message.attachment();
        Self {
            id: message.id,
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            sender_role: message.sender_role,
            receiver_id: message.receiver_id,
            receiver_name: message.receiver_name,
            receiver_role: message.receiver_role,
            is_group_message: message.is_group_message,
            content: message.content,
            attachment,
            read: message.read,
            created_at: message.created_at,
        }
    }
}

/// Request DTO for marking a thread read
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadDto {
    /// The user whose messages to the caller are marked read
    #[validate(regex(
        path = "*crate::shared::validation::USER_ID_REGEX",
        message = "senderId is not a valid user id"
    ))]
    pub sender_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkReadResponseDto {
    /// Number of messages flipped to read
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountDto {
    pub count: i64,
}
