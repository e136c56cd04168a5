use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::message::Message;
use crate::features::users::models::Role;

/// Per-(user, counterpart) conversation summary.
///
/// Maintained incrementally on every direct send and mark-read; can be
/// recomputed from history with [`fold_conversations`].
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ConversationSummary {
    pub user_id: String,
    pub counterpart_id: String,
    pub counterpart_name: String,
    pub counterpart_role: Option<Role>,
    pub last_message_id: Uuid,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

impl ConversationSummary {
    /// The contribution of one message to `owner_id`'s summary with the other party.
    ///
    /// Returns `None` for group messages and for messages `owner_id` is not part of.
    pub fn from_message(owner_id: &str, message: &Message) -> Option<Self> {
        if message.is_group_message {
            return None;
        }
        let receiver_id = message.receiver_id.as_deref()?;

        let (counterpart_id, counterpart_name, counterpart_role) = if message.sender_id == owner_id
        {
            (
                receiver_id.to_string(),
                message.receiver_name.clone().unwrap_or_default(),
                message.receiver_role,
            )
        } else if receiver_id == owner_id {
            (
                message.sender_id.clone(),
                message.sender_name.clone(),
                Some(message.sender_role),
            )
        } else {
            return None;
        };

        let unread_count = i64::from(receiver_id == owner_id && !message.read);

        Some(Self {
            user_id: owner_id.to_string(),
            counterpart_id,
            counterpart_name,
            counterpart_role,
            last_message_id: message.id,
            last_message: message.preview(),
            last_message_at: message.created_at,
            unread_count,
        })
    }

    /// Fold a newer contribution into this summary.
    ///
    /// Last write wins by timestamp; equal timestamps take the incoming value.
    pub fn merge(&mut self, other: ConversationSummary) {
        if other.last_message_at >= self.last_message_at {
            self.counterpart_name = other.counterpart_name;
            self.counterpart_role = other.counterpart_role.or(self.counterpart_role);
            self.last_message_id = other.last_message_id;
            self.last_message = other.last_message;
            self.last_message_at = other.last_message_at;
        }
        self.unread_count += other.unread_count;
    }
}

/// Recompute every conversation summary of `user_id` from message history.
///
/// Result is ordered by `last_message_at`, newest first.
pub fn fold_conversations(user_id: &str, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut by_counterpart: std::collections::HashMap<String, ConversationSummary> =
        std::collections::HashMap::new();

    for message in messages {
        let Some(contribution) = ConversationSummary::from_message(user_id, message) else {
            continue;
        };

        match by_counterpart.get_mut(&contribution.counterpart_id) {
            Some(existing) => existing.merge(contribution),
            None => {
                by_counterpart.insert(contribution.counterpart_id.clone(), contribution);
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = by_counterpart.into_values().collect();
    summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    summaries
}
