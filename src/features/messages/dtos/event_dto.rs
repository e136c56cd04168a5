use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payload of a `messages.read` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadEventDto {
    pub reader_id: String,
    pub sender_id: String,
    pub updated: u64,
}

/// Payload of a `resync` event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResyncEventDto {
    /// Events dropped because the subscriber fell behind
    pub skipped: u64,
}
