use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::{sse::Event, IntoResponse, Response, Sse},
};
use tokio_stream::StreamExt;

use crate::features::auth::model::SessionUser;
use crate::features::messages::services::DeliveryHub;

/// State for the delivery stream
#[derive(Clone)]
pub struct StreamState {
    pub hub: Arc<DeliveryHub>,
    pub keepalive: Duration,
}

/// Server-sent events for the caller: new messages and read receipts they may see
#[utoipa::path(
    get,
    path = "/api/messages/stream",
    responses(
        (status = 200, description = "SSE stream of message.created, messages.read and resync events", content_type = "text/event-stream"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "messages",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn stream_messages(user: SessionUser, State(state): State<StreamState>) -> Response {
    tracing::debug!(
        "User {} subscribed to delivery ({} connected)",
        user.user_id,
        state.hub.subscriber_count() + 1
    );

    let stream = state.hub.subscribe(user.user_id).map(|outgoing| {
        Ok::<_, Infallible>(
            Event::default()
                .event(outgoing.name)
                .data(outgoing.data.to_string()),
        )
    });

    Sse::new(stream)
        .keep_alive(
            axum::response::sse::KeepAlive::new()
                .interval(state.keepalive)
                .text("ping"),
        )
        .into_response()
}
