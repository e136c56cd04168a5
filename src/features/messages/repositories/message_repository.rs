use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::messages::models::{ConversationSummary, Message, NewMessage};

/// Which messages a listing covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFilter {
    /// Shared feed
    Group,
    /// Direct messages between two users, both directions
    Thread { user_id: String, partner_id: String },
    /// Everything the user sent or received, group posts by the user included
    Involving { user_id: String },
}

impl MessageFilter {
    fn kind(&self) -> &'static str {
        match self {
            MessageFilter::Group => "group",
            MessageFilter::Thread { .. } => "thread",
            MessageFilter::Involving { .. } => "involving",
        }
    }

    fn user_id(&self) -> Option<&str> {
        match self {
            MessageFilter::Group => None,
            MessageFilter::Thread { user_id, .. } | MessageFilter::Involving { user_id } => {
                Some(user_id)
            }
        }
    }

    fn partner_id(&self) -> Option<&str> {
        match self {
            MessageFilter::Thread { partner_id, .. } => Some(partner_id),
            _ => None,
        }
    }

    /// In-process equivalent of the SQL predicate
    #[cfg(test)]
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            MessageFilter::Group => message.is_group_message,
            MessageFilter::Thread {
                user_id,
                partner_id,
            } => {
                let receiver = message.receiver_id.as_deref();
                (message.sender_id == *user_id && receiver == Some(partner_id.as_str()))
                    || (message.sender_id == *partner_id && receiver == Some(user_id.as_str()))
            }
            MessageFilter::Involving { user_id } => {
                message.sender_id == *user_id || message.receiver_id.as_deref() == Some(user_id)
            }
        }
    }

    /// Feed and thread read oldest first; a user's own history newest first
    pub fn newest_first(&self) -> bool {
        matches!(self, MessageFilter::Involving { .. })
    }
}

/// Position in the `(created_at, id)` ordering of messages.
///
/// Without an id the cursor compares on the timestamp alone, which skips
/// every row sharing that timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCursor {
    pub created_at: DateTime<Utc>,
    pub id: Option<Uuid>,
}

impl MessageCursor {
    #[cfg(test)]
    pub fn of(message: &Message) -> Self {
        Self {
            created_at: message.created_at,
            id: Some(message.id),
        }
    }

    #[cfg(test)]
    pub fn is_before(&self, message: &Message) -> bool {
        message.created_at < self.created_at
            || self
                .id
                .is_some_and(|id| message.created_at == self.created_at && message.id < id)
    }

    #[cfg(test)]
    pub fn is_after(&self, message: &Message) -> bool {
        message.created_at > self.created_at
            || self
                .id
                .is_some_and(|id| message.created_at == self.created_at && message.id > id)
    }
}

#[derive(Debug, Clone)]
pub struct MessageQuery {
    pub filter: MessageFilter,
    /// Strictly older than
    pub before: Option<MessageCursor>,
    /// Strictly newer than
    pub after: Option<MessageCursor>,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    /// Rows matching the filter, cursors ignored
    pub total: i64,
    /// More rows exist past the page in the direction it was read
    pub has_more: bool,
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a message; direct messages also upsert both parties' summaries.
    ///
    /// The stored row carries the store's insert-time timestamp.
    async fn append(&self, message: NewMessage) -> Result<Message>;

    async fn list(&self, query: &MessageQuery) -> Result<MessagePage>;

    /// Flip every unread message from `sender_id` to `recipient_id` and
    /// recount the recipient's unread messages from that sender.
    async fn mark_read(&self, sender_id: &str, recipient_id: &str) -> Result<u64>;

    async fn unread_count(&self, user_id: &str) -> Result<i64>;

    /// Stored summaries, newest conversation first
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>>;

    /// Every direct message the user sent or received
    async fn direct_history(&self, user_id: &str) -> Result<Vec<Message>>;

    /// Swap a user's stored summaries for `summaries`
    async fn replace_conversations(
        &self,
        user_id: &str,
        summaries: &[ConversationSummary],
    ) -> Result<()>;
}

const MESSAGE_COLUMNS: &str = "id, sender_id, sender_name, sender_role, receiver_id, receiver_name, \
    receiver_role, is_group_message, content, attachment_url, attachment_filename, \
    attachment_size, attachment_mime_type, read, created_at";

const FILTER_PREDICATE: &str = r#"
    (
        ($1 = 'group' AND is_group_message)
        OR ($1 = 'thread' AND (
            (sender_id = $2 AND receiver_id = $3)
            OR (sender_id = $3 AND receiver_id = $2)
        ))
        OR ($1 = 'involving' AND (sender_id = $2 OR receiver_id = $2))
    )
"#;

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_summary(
        tx: &mut Transaction<'_, Postgres>,
        summary: &ConversationSummary,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO conversation_summaries (
                user_id, counterpart_id, counterpart_name, counterpart_role,
                last_message_id, last_message, last_message_at, unread_count, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (user_id, counterpart_id) DO UPDATE SET
                counterpart_name = CASE
                    WHEN EXCLUDED.last_message_at >= conversation_summaries.last_message_at
                    THEN EXCLUDED.counterpart_name
                    ELSE conversation_summaries.counterpart_name
                END,
                counterpart_role = COALESCE(EXCLUDED.counterpart_role, conversation_summaries.counterpart_role),
                last_message_id = CASE
                    WHEN EXCLUDED.last_message_at >= conversation_summaries.last_message_at
                    THEN EXCLUDED.last_message_id
                    ELSE conversation_summaries.last_message_id
                END,
                last_message = CASE
                    WHEN EXCLUDED.last_message_at >= conversation_summaries.last_message_at
                    THEN EXCLUDED.last_message
                    ELSE conversation_summaries.last_message
                END,
                last_message_at = GREATEST(EXCLUDED.last_message_at, conversation_summaries.last_message_at),
                unread_count = conversation_summaries.unread_count + EXCLUDED.unread_count,
                updated_at = NOW()
            "#,
        )
        .bind(&summary.user_id)
        .bind(&summary.counterpart_id)
        .bind(&summary.counterpart_name)
        .bind(summary.counterpart_role)
        .bind(summary.last_message_id)
        .bind(&summary.last_message)
        .bind(summary.last_message_at)
        .bind(summary.unread_count)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, message: NewMessage) -> Result<Message> {
        let message = message.into_message();
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (
                id, sender_id, sender_name, sender_role, receiver_id, receiver_name,
                receiver_role, is_group_message, content, attachment_url, attachment_filename,
                attachment_size, attachment_mime_type, read, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, clock_timestamp())
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(message.id)
        .bind(&message.sender_id)
        .bind(&message.sender_name)
        .bind(message.sender_role)
        .bind(&message.receiver_id)
        .bind(&message.receiver_name)
        .bind(message.receiver_role)
        .bind(message.is_group_message)
        .bind(&message.content)
        .bind(&message.attachment_url)
        .bind(&message.attachment_filename)
        .bind(message.attachment_size)
        .bind(&message.attachment_mime_type)
        .bind(message.read)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(receiver_id) = stored.receiver_id.as_deref() {
            for owner in [stored.sender_id.as_str(), receiver_id] {
                if let Some(summary) = ConversationSummary::from_message(owner, &stored) {
                    Self::upsert_summary(&mut tx, &summary).await?;
                }
            }
        }

        tx.commit().await?;

        Ok(stored)
    }

    async fn list(&self, query: &MessageQuery) -> Result<MessagePage> {
        // Reading forward from `after` serves pollers; otherwise page backwards from the newest
        let ascending = query.after.is_some();
        let order = if ascending { "ASC" } else { "DESC" };

        let mut messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {}
            FROM messages
            WHERE {}
              AND ($4::timestamptz IS NULL OR created_at < $4
                   OR (created_at = $4 AND id < $5::uuid))
              AND ($6::timestamptz IS NULL OR created_at > $6
                   OR (created_at = $6 AND id > $7::uuid))
            ORDER BY created_at {order}, id {order}
            LIMIT $8
            "#,
            MESSAGE_COLUMNS,
            FILTER_PREDICATE,
            order = order
        ))
        .bind(query.filter.kind())
        .bind(query.filter.user_id())
        .bind(query.filter.partner_id())
        .bind(query.before.map(|c| c.created_at))
        .bind(query.before.and_then(|c| c.id))
        .bind(query.after.map(|c| c.created_at))
        .bind(query.after.and_then(|c| c.id))
        .bind(query.limit + 1)
        .fetch_all(&self.pool)
        .await?;

        let has_more = messages.len() as i64 > query.limit;
        messages.truncate(query.limit as usize);

        if ascending == query.filter.newest_first() {
            messages.reverse();
        }

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM messages WHERE {}",
            FILTER_PREDICATE
        ))
        .bind(query.filter.kind())
        .bind(query.filter.user_id())
        .bind(query.filter.partner_id())
        .fetch_one(&self.pool)
        .await?;

        Ok(MessagePage {
            messages,
            total,
            has_more,
        })
    }

    async fn mark_read(&self, sender_id: &str, recipient_id: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE messages
            SET read = TRUE
            WHERE sender_id = $1 AND receiver_id = $2 AND read = FALSE
            "#,
        )
        .bind(sender_id)
        .bind(recipient_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            UPDATE conversation_summaries
            SET unread_count = (
                    SELECT COUNT(*) FROM messages
                    WHERE sender_id = $2 AND receiver_id = $1 AND read = FALSE
                ),
                updated_at = NOW()
            WHERE user_id = $1 AND counterpart_id = $2
            "#,
        )
        .bind(recipient_id)
        .bind(sender_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn unread_count(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let summaries = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT user_id, counterpart_id, counterpart_name, counterpart_role,
                   last_message_id, last_message, last_message_at, unread_count
            FROM conversation_summaries
            WHERE user_id = $1
            ORDER BY last_message_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    async fn direct_history(&self, user_id: &str) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {}
            FROM messages
            WHERE is_group_message = FALSE
              AND (sender_id = $1 OR receiver_id = $1)
            ORDER BY created_at ASC, id ASC
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn replace_conversations(
        &self,
        user_id: &str,
        summaries: &[ConversationSummary],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM conversation_summaries WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for summary in summaries {
            Self::upsert_summary(&mut tx, summary).await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
