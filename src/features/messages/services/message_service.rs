use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::core::config::MessagingConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::SessionUser;
use crate::features::messages::dtos::{
    ListMessagesQuery, MarkReadDto, MarkReadResponseDto, MessageResponseDto, MessageScope,
    MessagesReadEventDto, SendMessageDto,
};
use crate::features::messages::models::{Attachment, NewMessage, Recipient};
use crate::features::messages::repositories::{
    MessageCursor, MessageFilter, MessageQuery, MessageRepository,
};
use crate::features::uploads::UploadService;
use crate::features::users::UserService;
use crate::shared::types::{Meta, PageCursor};

use super::delivery_hub::{DeliveryEvent, DeliveryHub};

/// Sends, lists and marks messages read; publishes every committed change
pub struct MessageService {
    repository: Arc<dyn MessageRepository>,
    users: Arc<UserService>,
    uploads: Arc<UploadService>,
    hub: Arc<DeliveryHub>,
    config: MessagingConfig,
}

impl MessageService {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        users: Arc<UserService>,
        uploads: Arc<UploadService>,
        hub: Arc<DeliveryHub>,
        config: MessagingConfig,
    ) -> Self {
        Self {
            repository,
            users,
            uploads,
            hub,
            config,
        }
    }

    /// Resolve the addressee; `None` posts to the group feed
    async fn resolve_recipient(
        &self,
        sender: &SessionUser,
        receiver_id: Option<&str>,
    ) -> Result<Recipient> {
        let Some(receiver_id) = receiver_id else {
            return Ok(Recipient::Group);
        };

        if receiver_id == sender.user_id {
            return Err(AppError::Validation(
                "You cannot send a message to yourself".to_string(),
            ));
        }

        let receiver = self.users.find(receiver_id).await?.ok_or_else(|| {
            AppError::Validation(format!("Receiver {} does not exist", receiver_id))
        })?;

        Ok(Recipient::Direct {
            name: receiver.display_name(),
            role: receiver.role,
            id: receiver.id,
        })
    }

    pub async fn send(&self, sender: &SessionUser, dto: SendMessageDto) -> Result<MessageResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if dto.attachment.is_some() && dto.upload_token.is_some() {
            return Err(AppError::Validation(
                "Provide either attachment or uploadToken, not both".to_string(),
            ));
        }

        let content = dto.content.trim().to_string();
        if content.is_empty() && dto.attachment.is_none() && dto.upload_token.is_none() {
            return Err(AppError::Validation(
                "Message content or an attachment is required".to_string(),
            ));
        }

        if content.chars().count() > self.config.max_content_length {
            return Err(AppError::Validation(format!(
                "Message content must not exceed {} characters",
                self.config.max_content_length
            )));
        }

        if let Some(attachment) = &dto.attachment {
            if attachment.size > self.uploads.max_attachment_size() {
                return Err(AppError::Validation(format!(
                    "Attachment exceeds the maximum size of {} bytes",
                    self.uploads.max_attachment_size()
                )));
            }
        }

        let recipient = self
            .resolve_recipient(sender, dto.receiver_id.as_deref())
            .await?;

        // Claimed last so a rejected request does not burn the token
        let attachment: Option<Attachment> = match (dto.attachment, dto.upload_token) {
            (Some(attachment), _) => Some(attachment.into()),
            (None, Some(token)) => Some(
                self.uploads
                    .claim_attachment(token, &sender.user_id)
                    .await?,
            ),
            (None, None) => None,
        };

        let appended = self
            .repository
            .append(NewMessage {
                id: Uuid::now_v7(),
                sender_id: sender.user_id.clone(),
                sender_name: sender.name.clone(),
                sender_role: sender.role,
                recipient,
                content,
                attachment,
                created_at: Utc::now(),
            })
            .await;

        let message = match appended {
            Ok(message) => message,
            Err(e) => {
                if let Some(token) = dto.upload_token {
                    if let Err(release_error) =
                        self.uploads.release_attachment(token, &sender.user_id).await
                    {
                        tracing::error!(
                            "Failed to release upload {} after a failed send: {}",
                            token,
                            release_error
                        );
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(
            "User {} ({}) sent message {} ({})",
            sender.user_id,
            sender.role,
            message.id,
            message.receiver_id.as_deref().unwrap_or("group")
        );

        self.hub
            .publish(DeliveryEvent::MessageCreated(message.clone()));

        Ok(message.into())
    }

    fn resolve_filter(viewer: &SessionUser, query: &ListMessagesQuery) -> Result<MessageFilter> {
        match (&query.partner_id, query.scope) {
            (Some(_), Some(_)) => Err(AppError::Validation(
                "partnerId cannot be combined with scope".to_string(),
            )),
            (Some(partner_id), None) => {
                if *partner_id == viewer.user_id {
                    return Err(AppError::Validation(
                        "partnerId must be another user".to_string(),
                    ));
                }
                Ok(MessageFilter::Thread {
                    user_id: viewer.user_id.clone(),
                    partner_id: partner_id.clone(),
                })
            }
            (None, Some(MessageScope::Mine)) => Ok(MessageFilter::Involving {
                user_id: viewer.user_id.clone(),
            }),
            (None, Some(MessageScope::Group)) | (None, None) => Ok(MessageFilter::Group),
        }
    }

    fn cursor(
        at: Option<DateTime<Utc>>,
        id: Option<Uuid>,
        id_name: &str,
        at_name: &str,
    ) -> Result<Option<MessageCursor>> {
        match (at, id) {
            (Some(created_at), id) => Ok(Some(MessageCursor { created_at, id })),
            (None, Some(_)) => Err(AppError::Validation(format!(
                "{} requires {}",
                id_name, at_name
            ))),
            (None, None) => Ok(None),
        }
    }

    /// One page of messages plus `total` / `hasMore` / `nextCursor` meta
    pub async fn list(
        &self,
        viewer: &SessionUser,
        query: &ListMessagesQuery,
    ) -> Result<(Vec<MessageResponseDto>, Meta)> {
        query
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let before = Self::cursor(query.before, query.before_id, "beforeId", "before")?;
        let after = Self::cursor(query.after, query.after_id, "afterId", "after")?;

        if let (Some(before), Some(after)) = (before, after) {
            let overlaps = match (after.id, before.id) {
                (Some(after_id), Some(before_id)) => {
                    (after.created_at, after_id) >= (before.created_at, before_id)
                }
                _ => after.created_at >= before.created_at,
            };
            if overlaps {
                return Err(AppError::Validation(
                    "after must be earlier than before".to_string(),
                ));
            }
        }

        let filter = Self::resolve_filter(viewer, query)?;
        let limit = query
            .limit
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size);

        let page = self
            .repository
            .list(&MessageQuery {
                filter,
                before,
                after,
                limit,
            })
            .await?;

        // Forward reads continue from the newest row, backward reads from the oldest
        let boundary = if after.is_some() {
            page.messages.iter().max_by_key(|m| (m.created_at, m.id))
        } else {
            page.messages.iter().min_by_key(|m| (m.created_at, m.id))
        };
        let next_cursor = boundary.map(|m| PageCursor {
            created_at: m.created_at,
            id: m.id,
        });

        let meta = Meta::page(page.total, page.has_more, next_cursor);
        let messages = page.messages.into_iter().map(Into::into).collect();

        Ok((messages, meta))
    }

    /// Mark everything `dto.sender_id` sent to the reader as read. Idempotent.
    pub async fn mark_read(
        &self,
        reader: &SessionUser,
        dto: MarkReadDto,
    ) -> Result<MarkReadResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let updated = self
            .repository
            .mark_read(&dto.sender_id, &reader.user_id)
            .await?;

        if updated > 0 {
            tracing::debug!(
                "User {} read {} messages from {}",
                reader.user_id,
                updated,
                dto.sender_id
            );
            self.hub
                .publish(DeliveryEvent::MessagesRead(MessagesReadEventDto {
                    reader_id: reader.user_id.clone(),
                    sender_id: dto.sender_id,
                    updated,
                }));
        }

        Ok(MarkReadResponseDto { updated })
    }

    pub async fn unread_count(&self, user: &SessionUser) -> Result<i64> {
        self.repository.unread_count(&user.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::messages::dtos::AttachmentInputDto;
    use crate::features::messages::models::{ConversationSummary, Message};
    use crate::features::messages::repositories::MessagePage;
    use crate::features::users::models::Role;
    use crate::shared::test_helpers::{
        session_user, test_upload, test_user, InMemoryMessageRepository,
        InMemoryUploadRepository, InMemoryUserRepository,
    };
    use tokio_stream::StreamExt;

    struct Fixture {
        service: MessageService,
        repository: Arc<InMemoryMessageRepository>,
        uploads: Arc<InMemoryUploadRepository>,
        hub: Arc<DeliveryHub>,
    }

    fn service_with(
        repository: Arc<dyn MessageRepository>,
        uploads: Arc<InMemoryUploadRepository>,
        hub: Arc<DeliveryHub>,
    ) -> MessageService {
        let users = Arc::new(UserService::new(Arc::new(
            InMemoryUserRepository::with_users(vec![
                test_user("s-1", Role::Student, "Almaz", "Tesfaye"),
                test_user("t-1", Role::Teacher, "Bekele", "Girma"),
                test_user("s-2", Role::Student, "Chaltu", "Abdi"),
            ]),
        )));
        let uploads = Arc::new(UploadService::new(uploads, Default::default()));

        MessageService::new(repository, users, uploads, hub, MessagingConfig::default())
    }

    fn fixture() -> Fixture {
        let uploads = Arc::new(InMemoryUploadRepository::default());
        let repository = Arc::new(InMemoryMessageRepository::default());
        let hub = Arc::new(DeliveryHub::new(16));

        Fixture {
            service: service_with(repository.clone(), uploads.clone(), hub.clone()),
            repository,
            uploads,
            hub,
        }
    }

    /// Store that fails every call, as when the pool is exhausted
    struct UnavailableStore;

    fn unavailable() -> AppError {
        AppError::Database(sqlx::Error::PoolTimedOut)
    }

    #[async_trait::async_trait]
    impl MessageRepository for UnavailableStore {
        async fn append(&self, _message: NewMessage) -> Result<Message> {
            Err(unavailable())
        }

        async fn list(&self, _query: &MessageQuery) -> Result<MessagePage> {
            Err(unavailable())
        }

        async fn mark_read(&self, _sender_id: &str, _recipient_id: &str) -> Result<u64> {
            Err(unavailable())
        }

        async fn unread_count(&self, _user_id: &str) -> Result<i64> {
            Err(unavailable())
        }

        async fn list_conversations(&self, _user_id: &str) -> Result<Vec<ConversationSummary>> {
            Err(unavailable())
        }

        async fn direct_history(&self, _user_id: &str) -> Result<Vec<Message>> {
            Err(unavailable())
        }

        async fn replace_conversations(
            &self,
            _user_id: &str,
            _summaries: &[ConversationSummary],
        ) -> Result<()> {
            Err(unavailable())
        }
    }

    fn group_post(id: u128, content: &str, created_at: DateTime<Utc>) -> NewMessage {
        NewMessage {
            id: Uuid::from_u128(id),
            sender_id: "s-1".to_string(),
            sender_name: "Almaz Tesfaye".to_string(),
            sender_role: Role::Student,
            recipient: Recipient::Group,
            content: content.to_string(),
            attachment: None,
            created_at,
        }
    }

    fn to(receiver: &str, content: &str) -> SendMessageDto {
        SendMessageDto {
            content: content.to_string(),
            receiver_id: Some(receiver.to_string()),
            ..Default::default()
        }
    }

    fn thread_with(partner: &str) -> ListMessagesQuery {
        ListMessagesQuery {
            partner_id: Some(partner.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_message_without_attachment_is_rejected() {
        let f = fixture();
        let sender = session_user("s-1", Role::Student);

        for content in ["", "   \n\t"] {
            let result = f.service.send(&sender, to("t-1", content)).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert_eq!(f.repository.message_count(), 0);
    }

    #[tokio::test]
    async fn test_send_then_mark_read_round_trip() {
        let f = fixture();
        let student = session_user("s-1", Role::Student);
        let teacher = session_user("t-1", Role::Teacher);

        let sent = f.service.send(&student, to("t-1", "  hi  ")).await.unwrap();
        assert_eq!(sent.content, "hi");
        assert_eq!(sent.sender_name, student.name);
        assert_eq!(sent.receiver_name.as_deref(), Some("Bekele Girma"));
        assert_eq!(sent.receiver_role, Some(Role::Teacher));

        // Visible to both parties, unread
        for (viewer, partner) in [(&student, "t-1"), (&teacher, "s-1")] {
            let (thread, meta) = f.service.list(viewer, &thread_with(partner)).await.unwrap();
            assert_eq!(thread.len(), 1);
            assert_eq!(thread[0].content, "hi");
            assert!(!thread[0].read);
            assert_eq!(meta.total, 1);
        }
        assert_eq!(f.service.unread_count(&teacher).await.unwrap(), 1);

        let marked = f
            .service
            .mark_read(&teacher, MarkReadDto { sender_id: "s-1".to_string() })
            .await
            .unwrap();
        assert_eq!(marked.updated, 1);

        let (thread, _) = f.service.list(&student, &thread_with("t-1")).await.unwrap();
        assert!(thread[0].read);
        assert_eq!(f.service.unread_count(&teacher).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let f = fixture();
        let student = session_user("s-1", Role::Student);
        let teacher = session_user("t-1", Role::Teacher);
        f.service.send(&student, to("t-1", "one")).await.unwrap();
        f.service.send(&student, to("t-1", "two")).await.unwrap();

        let first = f
            .service
            .mark_read(&teacher, MarkReadDto { sender_id: "s-1".to_string() })
            .await
            .unwrap();
        let snapshot = f.repository.snapshot();
        let second = f
            .service
            .mark_read(&teacher, MarkReadDto { sender_id: "s-1".to_string() })
            .await
            .unwrap();

        assert_eq!(first.updated, 2);
        assert_eq!(second.updated, 0);
        let after: Vec<bool> = f.repository.snapshot().iter().map(|m| m.read).collect();
        let before: Vec<bool> = snapshot.iter().map(|m| m.read).collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_mark_read_only_touches_messages_to_the_reader() {
        let f = fixture();
        let student = session_user("s-1", Role::Student);
        let teacher = session_user("t-1", Role::Teacher);
        f.service.send(&student, to("t-1", "to teacher")).await.unwrap();
        f.service.send(&student, to("s-2", "to classmate")).await.unwrap();

        f.service
            .mark_read(&teacher, MarkReadDto { sender_id: "s-1".to_string() })
            .await
            .unwrap();

        let classmate = session_user("s-2", Role::Student);
        assert_eq!(f.service.unread_count(&classmate).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_or_self_receiver_is_rejected() {
        let f = fixture();
        let sender = session_user("s-1", Role::Student);

        let unknown = f.service.send(&sender, to("ghost", "hi")).await;
        assert!(matches!(unknown, Err(AppError::Validation(_))));

        let myself = f.service.send(&sender, to("s-1", "hi")).await;
        assert!(matches!(myself, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_content_length_is_capped() {
        let f = fixture();
        let sender = session_user("s-1", Role::Student);
        let too_long = "x".repeat(MessagingConfig::default().max_content_length + 1);

        let result = f.service.send(&sender, to("t-1", &too_long)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_group_feed_is_chronological() {
        let f = fixture();
        let sender = session_user("s-1", Role::Student);
        for content in ["first", "second", "third"] {
            f.service
                .send(
                    &sender,
                    SendMessageDto {
                        content: content.to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        f.service.send(&sender, to("t-1", "private")).await.unwrap();

        let (feed, meta) = f
            .service
            .list(&session_user("s-2", Role::Student), &ListMessagesQuery::default())
            .await
            .unwrap();

        assert_eq!(feed.len(), 3);
        assert!(feed.iter().all(|m| m.is_group_message));
        assert!(feed.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert_eq!(feed[0].content, "first");
        assert_eq!(meta.has_more, Some(false));
    }

    #[tokio::test]
    async fn test_page_size_reports_has_more() {
        let f = fixture();
        let sender = session_user("s-1", Role::Student);
        for i in 0..5 {
            f.service
                .send(&sender, to("t-1", &format!("message {}", i)))
                .await
                .unwrap();
        }

        let query = ListMessagesQuery {
            limit: Some(2),
            ..thread_with("t-1")
        };
        let (page, meta) = f.service.list(&sender, &query).await.unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "message 3");
        assert_eq!(page[1].content, "message 4");
        assert_eq!(meta.total, 5);
        assert_eq!(meta.has_more, Some(true));

        let cursor = meta.next_cursor.unwrap();
        assert_eq!(cursor.id, page[0].id);

        let older = ListMessagesQuery {
            limit: Some(10),
            before: Some(cursor.created_at),
            before_id: Some(cursor.id),
            ..thread_with("t-1")
        };
        let (rest, meta) = f.service.list(&sender, &older).await.unwrap();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[2].content, "message 2");
        assert_eq!(meta.has_more, Some(false));
    }

    #[tokio::test]
    async fn test_rows_sharing_a_timestamp_stay_reachable() {
        let f = fixture();
        let at = Utc::now();
        f.repository.append(group_post(1, "older", at)).await.unwrap();
        f.repository.append(group_post(2, "newer", at)).await.unwrap();
        let viewer = session_user("s-2", Role::Student);

        let first = ListMessagesQuery {
            limit: Some(1),
            ..Default::default()
        };
        let (page, meta) = f.service.list(&viewer, &first).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "newer");
        assert_eq!(meta.has_more, Some(true));
        let cursor = meta.next_cursor.unwrap();
        assert_eq!(cursor.id, Uuid::from_u128(2));

        let older = ListMessagesQuery {
            before: Some(cursor.created_at),
            before_id: Some(cursor.id),
            ..Default::default()
        };
        let (page, meta) = f.service.list(&viewer, &older).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "older");
        assert_eq!(meta.total, 2);
        assert_eq!(meta.has_more, Some(false));

        let newer = ListMessagesQuery {
            after: Some(at),
            after_id: Some(Uuid::from_u128(1)),
            ..Default::default()
        };
        let (page, _) = f.service.list(&viewer, &newer).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "newer");
    }

    #[tokio::test]
    async fn test_after_reads_a_thread_forward() {
        let f = fixture();
        let student = session_user("s-1", Role::Student);
        let teacher = session_user("t-1", Role::Teacher);
        for i in 0..4 {
            let (sender, receiver) = if i % 2 == 0 {
                (&student, "t-1")
            } else {
                (&teacher, "s-1")
            };
            f.service
                .send(sender, to(receiver, &format!("m{}", i)))
                .await
                .unwrap();
        }
        let stored = f.repository.snapshot();

        let query = ListMessagesQuery {
            after: Some(stored[1].created_at),
            after_id: Some(stored[1].id),
            limit: Some(1),
            ..thread_with("t-1")
        };
        let (page, meta) = f.service.list(&student, &query).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "m2");
        assert_eq!(meta.total, 4);
        // Newer rows remain
        assert_eq!(meta.has_more, Some(true));
        let cursor = meta.next_cursor.unwrap();
        assert_eq!(cursor.id, stored[2].id);

        let query = ListMessagesQuery {
            after: Some(stored[1].created_at),
            after_id: Some(stored[1].id),
            ..thread_with("s-1")
        };
        let (page, meta) = f.service.list(&teacher, &query).await.unwrap();
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3"]);
        assert_eq!(meta.has_more, Some(false));

        let query = ListMessagesQuery {
            after: Some(cursor.created_at),
            after_id: Some(cursor.id),
            ..thread_with("t-1")
        };
        let (page, _) = f.service.list(&student, &query).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "m3");
    }

    #[tokio::test]
    async fn test_after_reads_mine_scope_newest_first() {
        let f = fixture();
        let student = session_user("s-1", Role::Student);
        for i in 0..4 {
            f.service
                .send(&student, to("t-1", &format!("m{}", i)))
                .await
                .unwrap();
        }
        let stored = f.repository.snapshot();

        let query = ListMessagesQuery {
            scope: Some(MessageScope::Mine),
            after: Some(stored[0].created_at),
            after_id: Some(stored[0].id),
            limit: Some(2),
            ..Default::default()
        };
        let (page, meta) = f.service.list(&student, &query).await.unwrap();
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m1"]);
        assert_eq!(meta.has_more, Some(true));
        let cursor = meta.next_cursor.unwrap();
        assert_eq!(cursor.id, stored[2].id);

        let query = ListMessagesQuery {
            scope: Some(MessageScope::Mine),
            after: Some(cursor.created_at),
            after_id: Some(cursor.id),
            limit: Some(2),
            ..Default::default()
        };
        let (page, meta) = f.service.list(&student, &query).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "m3");
        assert_eq!(meta.has_more, Some(false));
    }

    #[tokio::test]
    async fn test_cursor_id_requires_its_timestamp() {
        let f = fixture();
        let query = ListMessagesQuery {
            before_id: Some(Uuid::now_v7()),
            ..Default::default()
        };

        let result = f
            .service
            .list(&session_user("s-1", Role::Student), &query)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_partner_and_scope_conflict() {
        let f = fixture();
        let query = ListMessagesQuery {
            scope: Some(MessageScope::Mine),
            ..thread_with("t-1")
        };

        let result = f
            .service
            .list(&session_user("s-1", Role::Student), &query)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_mine_scope_is_newest_first() {
        let f = fixture();
        let student = session_user("s-1", Role::Student);
        let teacher = session_user("t-1", Role::Teacher);
        f.service.send(&student, to("t-1", "question")).await.unwrap();
        f.service.send(&teacher, to("s-1", "answer")).await.unwrap();
        f.service.send(&teacher, to("s-2", "elsewhere")).await.unwrap();

        let query = ListMessagesQuery {
            scope: Some(MessageScope::Mine),
            ..Default::default()
        };
        let (mine, _) = f.service.list(&student, &query).await.unwrap();

        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].content, "answer");
        assert_eq!(mine[1].content, "question");
    }

    #[tokio::test]
    async fn test_upload_token_becomes_attachment() {
        let f = fixture();
        let upload = test_upload("s-1", "essay.docx", 2048);
        let token = upload.token_id;
        f.uploads.insert(upload);
        let sender = session_user("s-1", Role::Student);

        let dto = SendMessageDto {
            receiver_id: Some("t-1".to_string()),
            upload_token: Some(token),
            ..Default::default()
        };
        let sent = f.service.send(&sender, dto.clone()).await.unwrap();

        let attachment = sent.attachment.unwrap();
        assert_eq!(attachment.filename, "essay.docx");
        assert!(attachment.url.ends_with("essay.docx"));

        // Second use of the same token fails
        let again = f.service.send(&sender, dto).await;
        assert!(matches!(again, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_store_leaves_upload_token_usable() {
        let uploads = Arc::new(InMemoryUploadRepository::default());
        let upload = test_upload("s-1", "essay.pdf", 2048);
        let token = upload.token_id;
        uploads.insert(upload);
        let sender = session_user("s-1", Role::Student);
        let dto = SendMessageDto {
            receiver_id: Some("t-1".to_string()),
            upload_token: Some(token),
            ..Default::default()
        };

        let broken = service_with(
            Arc::new(UnavailableStore),
            uploads.clone(),
            Arc::new(DeliveryHub::new(4)),
        );
        let result = broken.send(&sender, dto.clone()).await;
        assert!(matches!(result, Err(AppError::Database(_))));
        assert!(!uploads.is_claimed(token));

        let healthy = service_with(
            Arc::new(InMemoryMessageRepository::default()),
            uploads.clone(),
            Arc::new(DeliveryHub::new(4)),
        );
        let sent = healthy.send(&sender, dto).await.unwrap();
        assert_eq!(sent.attachment.unwrap().filename, "essay.pdf");
        assert!(uploads.is_claimed(token));
    }

    #[tokio::test]
    async fn test_summary_unread_matches_store_after_mark_read() {
        let f = fixture();
        let student = session_user("s-1", Role::Student);
        let teacher = session_user("t-1", Role::Teacher);
        f.service.send(&student, to("t-1", "one")).await.unwrap();
        f.service.send(&student, to("t-1", "two")).await.unwrap();
        f.service
            .mark_read(&teacher, MarkReadDto { sender_id: "s-1".to_string() })
            .await
            .unwrap();
        assert_eq!(f.repository.stored_summaries("t-1")[0].unread_count, 0);

        f.service.send(&student, to("t-1", "three")).await.unwrap();

        let summaries = f.repository.stored_summaries("t-1");
        assert_eq!(summaries[0].unread_count, 1);
        assert_eq!(f.service.unread_count(&teacher).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_attachment_and_token_are_exclusive() {
        let f = fixture();
        let dto = SendMessageDto {
            receiver_id: Some("t-1".to_string()),
            attachment: Some(AttachmentInputDto {
                url: "https://files.campus.test/a.pdf".to_string(),
                filename: "a.pdf".to_string(),
                size: 10,
                mime_type: "application/pdf".to_string(),
            }),
            upload_token: Some(Uuid::now_v7()),
            ..Default::default()
        };

        let result = f
            .service
            .send(&session_user("s-1", Role::Student), dto)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_attachment_only_message_is_accepted() {
        let f = fixture();
        let dto = SendMessageDto {
            receiver_id: Some("t-1".to_string()),
            attachment: Some(AttachmentInputDto {
                url: "https://files.campus.test/a.pdf".to_string(),
                filename: "a.pdf".to_string(),
                size: 10,
                mime_type: "application/pdf".to_string(),
            }),
            ..Default::default()
        };

        let sent = f
            .service
            .send(&session_user("s-1", Role::Student), dto)
            .await
            .unwrap();
        assert_eq!(sent.content, "");
        assert!(sent.attachment.is_some());
    }

    #[tokio::test]
    async fn test_send_publishes_to_the_receiver() {
        let f = fixture();
        let mut stream = Box::pin(f.hub.subscribe("t-1".to_string()));

        f.service
            .send(&session_user("s-1", Role::Student), to("t-1", "ping"))
            .await
            .unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.data["content"], "ping");
    }
}
