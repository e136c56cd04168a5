use crate::core::error::Result;
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::SessionUser;
use crate::features::messages::dtos::{ConversationResponseDto, RebuildResponseDto};
use crate::features::messages::services::ConversationService;
use crate::shared::types::{ApiResponse, Meta};
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

/// The caller's conversations with last-message preview and unread count
#[utoipa::path(
    get,
    path = "/api/conversations",
    responses(
        (status = 200, description = "Conversations retrieved successfully", body = ApiResponse<Vec<ConversationResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "conversations",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_conversations(
    user: SessionUser,
    State(service): State<Arc<ConversationService>>,
) -> Result<Json<ApiResponse<Vec<ConversationResponseDto>>>> {
    let conversations = service.list(&user.user_id).await?;
    let total = conversations.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(conversations),
        None,
        Some(Meta::total(total)),
    )))
}

/// Recompute a user's conversation summaries from message history
#[utoipa::path(
    post,
    path = "/api/admin/conversations/{user_id}/rebuild",
    params(
        ("user_id" = String, Path, description = "User whose summaries are rebuilt")
    ),
    responses(
        (status = 200, description = "Summaries rebuilt", body = ApiResponse<RebuildResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rebuild_conversations(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<ConversationService>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<RebuildResponseDto>>> {
    tracing::info!(
        "Admin {} requested conversation rebuild for {}",
        admin.user_id,
        user_id
    );

    let result = service.rebuild(&user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("Conversations rebuilt".to_string()),
        None,
    )))
}
