use crate::features::auth::handler;
use crate::features::users::UserService;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Protected auth routes (require a valid session)
pub fn protected_routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/auth/me", get(handler::get_me))
        .with_state(service)
}
