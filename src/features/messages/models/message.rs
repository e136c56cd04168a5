use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::users::models::Role;
use crate::shared::constants::attachment_preview;

/// File attached to a message, referenced by URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    /// Size in bytes
    pub size: i64,
    pub mime_type: String,
}

/// Who a new message is addressed to
#[derive(Debug, Clone)]
pub enum Recipient {
    /// Shared feed, visible to everyone
    Group,
    Direct {
        id: String,
        name: String,
        role: Role,
    },
}

/// A message ready to be stored.
///
/// `created_at` is the request clock; the Postgres store stamps the row at
/// insert instead.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: Uuid,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: Role,
    pub recipient: Recipient,
    pub content: String,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    /// The row as it looks right after insertion
    pub fn into_message(self) -> Message {
        let (receiver_id, receiver_name, receiver_role, is_group_message) = match self.recipient {
            Recipient::Group => (None, None, None, true),
            Recipient::Direct { id, name, role } => (Some(id), Some(name), Some(role), false),
        };
        let (attachment_url, attachment_filename, attachment_size, attachment_mime_type) =
            match self.attachment {
                Some(a) => (Some(a.url), Some(a.filename), Some(a.size), Some(a.mime_type)),
                None => (None, None, None, None),
            };

        Message {
            id: self.id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            sender_role: self.sender_role,
            receiver_id,
            receiver_name,
            receiver_role,
            is_group_message,
            content: self.content,
            attachment_url,
            attachment_filename,
            attachment_size,
            attachment_mime_type,
            read: false,
            created_at: self.created_at,
        }
    }
}

/// Database model for a stored message.
///
/// Exactly one of `receiver_id` / `is_group_message` is set; the table
/// enforces it with a CHECK constraint.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: Role,
    pub receiver_id: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_role: Option<Role>,
    pub is_group_message: bool,
    pub content: String,
    pub attachment_url: Option<String>,
    pub attachment_filename: Option<String>,
    pub attachment_size: Option<i64>,
    pub attachment_mime_type: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn attachment(&self) -> Option<Attachment> {
        match (&self.attachment_url, &self.attachment_filename) {
            (Some(url), Some(filename)) => Some(Attachment {
                url: url.clone(),
                filename: filename.clone(),
                size: self.attachment_size.unwrap_or(0),
                mime_type: self
                    .attachment_mime_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            }),
            _ => None,
        }
    }

    /// Text shown in conversation lists
    pub fn preview(&self) -> String {
        match (&self.attachment_filename, self.content.is_empty()) {
            (Some(filename), true) => attachment_preview(filename),
            _ => self.content.clone(),
        }
    }

    /// Group messages are public; direct messages only reach their two parties
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_group_message
            || self.sender_id == user_id
            || self.receiver_id.as_deref() == Some(user_id)
    }
}
