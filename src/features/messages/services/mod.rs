mod conversation_service;
mod delivery_hub;
mod message_service;

pub use conversation_service::ConversationService;
pub use delivery_hub::DeliveryHub;
pub use message_service::MessageService;
