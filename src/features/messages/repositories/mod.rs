mod message_repository;

pub use message_repository::{
    MessageCursor, MessageFilter, MessagePage, MessageQuery, MessageRepository, PgMessageRepository,
};
