use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::messages::handlers::{self, StreamState};
use crate::features::messages::services::{ConversationService, MessageService};

/// Message store and delivery routes (require a valid session)
pub fn routes(service: Arc<MessageService>, stream: StreamState) -> Router {
    let store = Router::new()
        .route(
            "/api/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .route("/api/messages/read", post(handlers::mark_read))
        .route("/api/messages/unread-count", get(handlers::unread_count))
        .with_state(service);

    let delivery = Router::new()
        .route("/api/messages/stream", get(handlers::stream_messages))
        .with_state(stream);

    store.merge(delivery)
}

/// Conversation list and admin rebuild (require a valid session)
pub fn conversation_routes(service: Arc<ConversationService>) -> Router {
    Router::new()
        .route("/api/conversations", get(handlers::list_conversations))
        .route(
            "/api/admin/conversations/{user_id}/rebuild",
            post(handlers::rebuild_conversations),
        )
        .with_state(service)
}
