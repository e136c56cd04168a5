//! Fixtures and in-memory repositories shared by unit and router tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::{DateTime, Duration, Utc};
use fake::faker::lorem::en::Word;
use fake::Fake;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::{SessionClaims, SessionUser};
use crate::features::messages::models::{ConversationSummary, Message, NewMessage};
use crate::features::messages::repositories::{
    MessagePage, MessageQuery, MessageRepository,
};
use crate::features::uploads::models::UploadAsset;
use crate::features::uploads::repositories::UploadRepository;
use crate::features::users::models::{Role, User};
use crate::features::users::repositories::{UserFilter, UserRepository};

pub const TEST_JWT_SECRET: &str = "test-secret-for-session-tokens";

/// HS256 session token as issued by the portal, valid for an hour
pub fn sign_session_token(user_id: &str, role: Role, first_name: &str, last_name: &str) -> String {
    let claims = SessionClaims {
        user_id: Some(user_id.to_string()),
        sub: None,
        email: Some(format!("{}@campus.test", user_id)),
        role,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as u64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("signing a test token")
}

pub fn session_user(user_id: &str, role: Role) -> SessionUser {
    SessionUser {
        user_id: user_id.to_string(),
        email: Some(format!("{}@campus.test", user_id)),
        name: format!("User {}", user_id),
        role,
    }
}

pub fn test_user(id: &str, role: Role, first_name: &str, last_name: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@campus.test", id),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role,
        department: Some(Word().fake()),
        year: (role == Role::Student).then_some(2),
        semester: (role == Role::Student).then_some(1),
        created_at: Utc::now(),
    }
}

/// Unclaimed upload owned by `uploader_id`, expiring in an hour
pub fn test_upload(uploader_id: &str, filename: &str, size: i64) -> UploadAsset {
    let token_id = Uuid::new_v4();
    let mime_type = match filename.rsplit('.').next() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    };

    UploadAsset {
        token_id,
        uploaded_by: uploader_id.to_string(),
        original_name: filename.to_string(),
        storage_path: format!("uploads/{}/{}-{}", uploader_id, token_id, filename),
        mime_type: mime_type.to_string(),
        size,
        upload_type: "message".to_string(),
        claimed: false,
        created_at: Utc::now(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// Router layer that authenticates every request as `user`
pub fn with_session(router: Router, user: SessionUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Vec<User>,
}

impl InMemoryUserRepository {
    pub fn with_users(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let search = filter.search.as_ref().map(|s| s.to_lowercase());

        let users = self
            .users
            .iter()
            .filter(|u| filter.exclude_id.as_deref() != Some(u.id.as_str()))
            .filter(|u| filter.role.is_none_or(|role| u.role == role))
            .filter(|u| {
                search.as_deref().is_none_or(|term| {
                    u.first_name.to_lowercase().contains(term)
                        || u.last_name.to_lowercase().contains(term)
                        || u.email.to_lowercase().contains(term)
                        || u.display_name().to_lowercase().contains(term)
                })
            })
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok(users)
    }
}

// =============================================================================
// UPLOADS
// =============================================================================

#[derive(Default)]
pub struct InMemoryUploadRepository {
    uploads: Mutex<HashMap<Uuid, UploadAsset>>,
}

impl InMemoryUploadRepository {
    pub fn with_uploads(uploads: Vec<UploadAsset>) -> Self {
        let repository = Self::default();
        for upload in uploads {
            repository.insert(upload);
        }
        repository
    }

    pub fn insert(&self, upload: UploadAsset) {
        self.uploads.lock().unwrap().insert(upload.token_id, upload);
    }

    pub fn is_claimed(&self, token_id: Uuid) -> bool {
        self.uploads
            .lock()
            .unwrap()
            .get(&token_id)
            .is_some_and(|upload| upload.claimed)
    }
}

#[async_trait]
impl UploadRepository for InMemoryUploadRepository {
    async fn claim(
        &self,
        token_id: Uuid,
        uploader_id: &str,
        now: DateTime<Utc>,
        max_size: i64,
    ) -> Result<Option<UploadAsset>> {
        let mut uploads = self.uploads.lock().unwrap();
        let Some(upload) = uploads.get_mut(&token_id) else {
            return Ok(None);
        };

        if upload.claimed
            || upload.uploaded_by != uploader_id
            || upload.expires_at <= now
            || upload.size > max_size
        {
            return Ok(None);
        }

        upload.claimed = true;
        Ok(Some(upload.clone()))
    }

    async fn release(&self, token_id: Uuid, uploader_id: &str) -> Result<bool> {
        let mut uploads = self.uploads.lock().unwrap();
        match uploads.get_mut(&token_id) {
            Some(upload) if upload.claimed && upload.uploaded_by == uploader_id => {
                upload.claimed = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Message store keeping rows and summaries in memory.
///
/// Rows keep the timestamp they were appended with, ties included.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<Message>>,
    summaries: Mutex<HashMap<(String, String), ConversationSummary>>,
}

impl InMemoryMessageRepository {
    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn stored_summaries(&self, user_id: &str) -> Vec<ConversationSummary> {
        let mut summaries: Vec<ConversationSummary> = self
            .summaries
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        summaries
    }

    pub fn clear_summaries(&self) {
        self.summaries.lock().unwrap().clear();
    }

    fn upsert_summary(&self, summary: ConversationSummary) {
        let key = (summary.user_id.clone(), summary.counterpart_id.clone());
        let mut summaries = self.summaries.lock().unwrap();
        match summaries.get_mut(&key) {
            Some(existing) => existing.merge(summary),
            None => {
                summaries.insert(key, summary);
            }
        }
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: NewMessage) -> Result<Message> {
        let message = message.into_message();
        self.messages.lock().unwrap().push(message.clone());

        if let Some(receiver_id) = message.receiver_id.clone() {
            for owner in [message.sender_id.clone(), receiver_id] {
                if let Some(summary) = ConversationSummary::from_message(&owner, &message) {
                    self.upsert_summary(summary);
                }
            }
        }

        Ok(message)
    }

    async fn list(&self, query: &MessageQuery) -> Result<MessagePage> {
        let messages = self.messages.lock().unwrap();
        let matching: Vec<&Message> = messages
            .iter()
            .filter(|m| query.filter.matches(m))
            .collect();
        let total = matching.len() as i64;

        let mut window: Vec<Message> = matching
            .into_iter()
            .filter(|m| query.before.is_none_or(|before| before.is_before(m)))
            .filter(|m| query.after.is_none_or(|after| after.is_after(m)))
            .cloned()
            .collect();
        window.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        let ascending = query.after.is_some();
        if !ascending {
            window.reverse();
        }

        let has_more = window.len() as i64 > query.limit;
        window.truncate(query.limit as usize);
        if ascending == query.filter.newest_first() {
            window.reverse();
        }

        Ok(MessagePage {
            messages: window,
            total,
            has_more,
        })
    }

    async fn mark_read(&self, sender_id: &str, recipient_id: &str) -> Result<u64> {
        let mut messages = self.messages.lock().unwrap();
        let mut updated = 0;
        for message in messages.iter_mut() {
            if message.sender_id == sender_id
                && message.receiver_id.as_deref() == Some(recipient_id)
                && !message.read
            {
                message.read = true;
                updated += 1;
            }
        }

        let key = (recipient_id.to_string(), sender_id.to_string());
        if let Some(summary) = self.summaries.lock().unwrap().get_mut(&key) {
            summary.unread_count = messages
                .iter()
                .filter(|m| {
                    m.sender_id == sender_id
                        && m.receiver_id.as_deref() == Some(recipient_id)
                        && !m.read
                })
                .count() as i64;
        }

        Ok(updated)
    }

    async fn unread_count(&self, user_id: &str) -> Result<i64> {
        let count = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.receiver_id.as_deref() == Some(user_id) && !m.read)
            .count();
        Ok(count as i64)
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        Ok(self.stored_summaries(user_id))
    }

    async fn direct_history(&self, user_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| !m.is_group_message)
            .filter(|m| m.sender_id == user_id || m.receiver_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn replace_conversations(
        &self,
        user_id: &str,
        summaries: &[ConversationSummary],
    ) -> Result<()> {
        let mut stored = self.summaries.lock().unwrap();
        stored.retain(|(owner, _), _| owner != user_id);
        for summary in summaries {
            stored.insert(
                (summary.user_id.clone(), summary.counterpart_id.clone()),
                summary.clone(),
            );
        }
        Ok(())
    }
}
