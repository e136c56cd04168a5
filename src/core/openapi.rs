use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::messages::{
    dtos as messages_dtos, handlers as messages_handlers, models as messages_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::shared::types::{ApiResponse, Meta, PageCursor};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handler::get_me,
        // Users
        users_handlers::list_contacts,
        users_handlers::get_user,
        // Messages
        messages_handlers::list_messages,
        messages_handlers::send_message,
        messages_handlers::mark_read,
        messages_handlers::unread_count,
        messages_handlers::stream_messages,
        // Conversations
        messages_handlers::list_conversations,
        // Admin
        messages_handlers::rebuild_conversations,
    ),
    components(
        schemas(
            // Shared
            Meta,
            PageCursor,
            // Auth
            auth::dto::MeResponseDto,
            auth::model::SessionUser,
            ApiResponse<auth::dto::MeResponseDto>,
            // Users
            users_models::Role,
            users_dtos::UserResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            // Messages
            messages_models::Attachment,
            messages_dtos::AttachmentInputDto,
            messages_dtos::SendMessageDto,
            messages_dtos::MessageScope,
            messages_dtos::MessageResponseDto,
            messages_dtos::MarkReadDto,
            messages_dtos::MarkReadResponseDto,
            messages_dtos::UnreadCountDto,
            messages_dtos::MessagesReadEventDto,
            messages_dtos::ResyncEventDto,
            ApiResponse<messages_dtos::MessageResponseDto>,
            ApiResponse<Vec<messages_dtos::MessageResponseDto>>,
            ApiResponse<messages_dtos::MarkReadResponseDto>,
            ApiResponse<messages_dtos::UnreadCountDto>,
            // Conversations
            messages_dtos::ConversationResponseDto,
            messages_dtos::RebuildResponseDto,
            ApiResponse<Vec<messages_dtos::ConversationResponseDto>>,
            ApiResponse<messages_dtos::RebuildResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Session introspection"),
        (name = "users", description = "Read-only user directory"),
        (name = "messages", description = "Direct and group messages, read receipts and live delivery"),
        (name = "conversations", description = "Per-user conversation summaries"),
        (name = "admin", description = "Admin endpoints (admin and head only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Campus Messaging API",
        version = "0.1.0",
        description = "Messaging service of the e-learning portal",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
