//! Read-only user directory.
//!
//! Resolves display names for messaging and serves the contact list. Email
//! addresses are projected away for student viewers.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/contacts` | Other users, filterable by role and search |
//! | GET | `/api/users/{id}` | One user |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgUserRepository;
pub use services::UserService;
