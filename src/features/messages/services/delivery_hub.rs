use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::core::error::{AppError, Result};
use crate::features::messages::dtos::{MessageResponseDto, MessagesReadEventDto, ResyncEventDto};
use crate::features::messages::models::Message;
use crate::shared::constants::{EVENT_MESSAGES_READ, EVENT_MESSAGE_CREATED, EVENT_RESYNC};

/// Something that happened in the message store after commit
#[derive(Debug, Clone)]
pub enum DeliveryEvent {
    MessageCreated(Message),
    MessagesRead(MessagesReadEventDto),
}

impl DeliveryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DeliveryEvent::MessageCreated(_) => EVENT_MESSAGE_CREATED,
            DeliveryEvent::MessagesRead(_) => EVENT_MESSAGES_READ,
        }
    }

    /// Group messages reach everyone; everything else only its parties
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        match self {
            DeliveryEvent::MessageCreated(message) => message.is_visible_to(user_id),
            DeliveryEvent::MessagesRead(read) => {
                read.reader_id == user_id || read.sender_id == user_id
            }
        }
    }

    pub fn payload(&self) -> Result<Value> {
        let payload = match self {
            DeliveryEvent::MessageCreated(message) => {
                serde_json::to_value(MessageResponseDto::from(message.clone()))
            }
            DeliveryEvent::MessagesRead(read) => serde_json::to_value(read),
        };
        payload.map_err(|e| AppError::Internal(format!("Failed to encode {}: {}", self.name(), e)))
    }
}

/// An event ready to be written to one subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub name: &'static str,
    pub data: Value,
}

/// Decide what, if anything, `user_id` receives for one item off the channel.
///
/// A lag turns into a `resync` so the client refetches what it missed.
pub fn deliverable(
    user_id: &str,
    item: std::result::Result<Arc<DeliveryEvent>, BroadcastStreamRecvError>,
) -> Option<Outgoing> {
    match item {
        Ok(event) if event.is_visible_to(user_id) => match event.payload() {
            Ok(data) => Some(Outgoing {
                name: event.name(),
                data,
            }),
            Err(e) => {
                tracing::error!("Dropping delivery event for {}: {}", user_id, e);
                None
            }
        },
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(
                "Delivery subscriber {} lagged, {} events skipped",
                user_id,
                skipped
            );
            Some(Outgoing {
                name: EVENT_RESYNC,
                data: serde_json::to_value(ResyncEventDto { skipped }).unwrap_or(Value::Null),
            })
        }
    }
}

/// In-process fan-out of store events to connected clients
pub struct DeliveryHub {
    sender: broadcast::Sender<Arc<DeliveryEvent>>,
}

impl DeliveryHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Never blocks; returns how many subscribers were reached
    pub fn publish(&self, event: DeliveryEvent) -> usize {
        let name = event.name();
        match self.sender.send(Arc::new(event)) {
            Ok(receivers) => {
                tracing::debug!("Published {} to {} subscribers", name, receivers);
                receivers
            }
            // No one is connected
            Err(_) => 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Events visible to `user_id`, from now on. Dropping the stream unsubscribes.
    pub fn subscribe(&self, user_id: String) -> impl Stream<Item = Outgoing> + Send + 'static {
        BroadcastStream::new(self.sender.subscribe())
            .filter_map(move |item| deliverable(&user_id, item))
    }
}
