mod conversation_handler;
mod message_handler;
mod stream_handler;

pub use conversation_handler::*;
pub use message_handler::*;
pub use stream_handler::*;
