use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::SessionUser;
use crate::features::users::dtos::{ContactQuery, UserResponseDto};
use crate::features::users::models::User;
use crate::features::users::repositories::{UserFilter, UserRepository};

/// Read-only user directory used for contact lists and name resolution
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Emails are only exposed to staff, and to users looking at themselves
    fn can_see_email(viewer: &SessionUser, user: &User) -> bool {
        viewer.is_staff() || viewer.user_id == user.id
    }

    /// Resolve a user by id, `None` when unknown
    pub async fn find(&self, id: &str) -> Result<Option<User>> {
        self.repository.find_by_id(id).await
    }

    /// Everyone the viewer can message, excluding the viewer
    pub async fn list_contacts(
        &self,
        viewer: &SessionUser,
        query: &ContactQuery,
    ) -> Result<Vec<UserResponseDto>> {
        let filter = UserFilter {
            exclude_id: Some(viewer.user_id.clone()),
            role: query.role,
            search: query.search.clone(),
            limit: query.limit(),
        };

        let users = self.repository.list(&filter).await?;

        tracing::debug!(
            "Listed {} contacts for user {} (role filter: {:?})",
            users.len(),
            viewer.user_id,
            query.role
        );

        Ok(users
            .into_iter()
            .map(|u| {
                let show_email = Self::can_see_email(viewer, &u);
                UserResponseDto::project(u, show_email)
            })
            .collect())
    }

    pub async fn get_user(&self, viewer: &SessionUser, id: &str) -> Result<UserResponseDto> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let show_email = Self::can_see_email(viewer, &user);
        Ok(UserResponseDto::project(user, show_email))
    }
}
