use crate::core::error::Result;
use crate::features::auth::dto::MeResponseDto;
use crate::features::auth::model::SessionUser;
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::UserService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Current session, enriched with the directory entry when one exists
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<MeResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    user: SessionUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<MeResponseDto>>> {
    let profile = service
        .find(&user.user_id)
        .await?
        .map(|u| UserResponseDto::project(u, true));

    Ok(Json(ApiResponse::success(
        Some(MeResponseDto {
            session: user,
            profile,
        }),
        None,
        None,
    )))
}
