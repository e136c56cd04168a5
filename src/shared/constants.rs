// =============================================================================
// DELIVERY EVENTS
// =============================================================================

/// SSE event name for a newly appended message
pub const EVENT_MESSAGE_CREATED: &str = "message.created";

/// SSE event name for a bulk mark-read
pub const EVENT_MESSAGES_READ: &str = "messages.read";

/// SSE event name telling a lagging subscriber to refetch
pub const EVENT_RESYNC: &str = "resync";

// =============================================================================
// PREVIEWS
// =============================================================================

/// Conversation preview used when a message carries only an attachment
pub fn attachment_preview(filename: &str) -> String {
    format!("Sent a file: {}", filename)
}
