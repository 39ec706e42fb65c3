use axum::{Router, routing::get};

use crate::state::AppState;
use crate::handlers::audit::{list_logs, logs_by_entity, logs_by_user, recent_logs, statistics};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audit", get(list_logs))
        .route("/audit/recent", get(recent_logs))
        .route("/audit/statistics", get(statistics))
        .route("/audit/entity/{entity}/{entity_id}", get(logs_by_entity))
        .route("/audit/user/{user_id}", get(logs_by_user))
        .route_layer(axum::middleware::from_fn(require_auth))
}
