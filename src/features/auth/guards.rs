//! Role-based authorization guards.
//!
//! Portal roles: student, teacher, admin, head. Admins and heads share the
//! administrative surface.

use crate::core::error::AppError;
use crate::features::auth::model::SessionUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for administrative endpoints.
///
/// Allows users with the "admin" or "head" role.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub SessionUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<SessionUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(user.clone()))
    }
}
