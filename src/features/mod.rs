pub mod auth;
pub mod messages;
pub mod uploads;
pub mod users;
