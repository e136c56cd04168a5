use crate::core::error::{AppError, Result};
use crate::features::auth::model::SessionUser;
use crate::features::users::dtos::{ContactQuery, UserResponseDto};
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// List the users the caller can message
#[utoipa::path(
    get,
    path = "/api/users/contacts",
    params(ContactQuery),
    responses(
        (status = 200, description = "Contacts retrieved successfully", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_contacts(
    user: SessionUser,
    State(service): State<Arc<UserService>>,
    Query(query): Query<ContactQuery>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let contacts = service.list_contacts(&user, &query).await?;
    let total = contacts.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(contacts),
        None,
        Some(Meta::total(total)),
    )))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user(
    user: SessionUser,
    State(service): State<Arc<UserService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let found = service.get_user(&user, &id).await?;
    Ok(Json(ApiResponse::success(Some(found), None, None)))
}
