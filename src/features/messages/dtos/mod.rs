mod conversation_dto;
mod event_dto;
mod message_dto;

pub use conversation_dto::*;
pub use event_dto::*;
pub use message_dto::*;
