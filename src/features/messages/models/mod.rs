mod conversation;
mod message;

pub use conversation::{fold_conversations, ConversationSummary};
pub use message::{Attachment, Message, NewMessage, Recipient};
