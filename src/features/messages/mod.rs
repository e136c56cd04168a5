//! Direct and group messaging.
//!
//! Messages are append-only. Each direct send upserts a summary row for both
//! parties in the same transaction, and committed changes are fanned out to
//! connected clients over server-sent events.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/messages` | Group feed, thread (`partnerId`) or `scope=mine` |
//! | POST | `/api/messages` | Send a message |
//! | POST | `/api/messages/read` | Mark a sender's messages read |
//! | GET | `/api/messages/unread-count` | Unread total for the caller |
//! | GET | `/api/messages/stream` | Server-sent delivery events |
//! | GET | `/api/conversations` | Conversation list |
//! | POST | `/api/admin/conversations/{userId}/rebuild` | Recompute summaries (admin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use handlers::StreamState;
pub use repositories::PgMessageRepository;
pub use services::{ConversationService, DeliveryHub, MessageService};
