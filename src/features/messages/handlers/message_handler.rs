use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::SessionUser;
use crate::features::messages::dtos::{
    ListMessagesQuery, MarkReadDto, MarkReadResponseDto, MessageResponseDto, SendMessageDto,
    UnreadCountDto,
};
use crate::features::messages::services::MessageService;
use crate::shared::types::ApiResponse;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// List messages: group feed, a thread with one partner, or everything the caller is part of
#[utoipa::path(
    get,
    path = "/api/messages",
    params(ListMessagesQuery),
    responses(
        (status = 200, description = "Messages retrieved successfully", body = ApiResponse<Vec<MessageResponseDto>>),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "messages",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_messages(
    user: SessionUser,
    State(service): State<Arc<MessageService>>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<ApiResponse<Vec<MessageResponseDto>>>> {
    let (messages, meta) = service.list(&user, &query).await?;
    Ok(Json(ApiResponse::success(Some(messages), None, Some(meta))))
}

/// Send a direct message, or post to the group feed when no receiver is given
#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessageDto,
    responses(
        (status = 201, description = "Message sent", body = ApiResponse<MessageResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "messages",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_message(
    user: SessionUser,
    State(service): State<Arc<MessageService>>,
    AppJson(dto): AppJson<SendMessageDto>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponseDto>>)> {
    let message = service.send(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(message),
            Some("Message sent".to_string()),
            None,
        )),
    ))
}

/// Mark every message from `senderId` to the caller as read
#[utoipa::path(
    post,
    path = "/api/messages/read",
    request_body = MarkReadDto,
    responses(
        (status = 200, description = "Messages marked as read", body = ApiResponse<MarkReadResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "messages",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_read(
    user: SessionUser,
    State(service): State<Arc<MessageService>>,
    AppJson(dto): AppJson<MarkReadDto>,
) -> Result<Json<ApiResponse<MarkReadResponseDto>>> {
    let result = service.mark_read(&user, dto).await?;
    Ok(Json(ApiResponse::success(Some(result), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/messages/unread-count",
    responses(
        (status = 200, description = "Unread direct messages addressed to the caller", body = ApiResponse<UnreadCountDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "messages",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unread_count(
    user: SessionUser,
    State(service): State<Arc<MessageService>>,
) -> Result<Json<ApiResponse<UnreadCountDto>>> {
    let count = service.unread_count(&user).await?;
    Ok(Json(ApiResponse::success(
        Some(UnreadCountDto { count }),
        None,
        None,
    )))
}
