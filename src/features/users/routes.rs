use crate::features::users::handlers;
use crate::features::users::services::UserService;
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/contacts", get(handlers::list_contacts))
        .route("/api/users/{id}", get(handlers::get_user))
        .with_state(service)
}
