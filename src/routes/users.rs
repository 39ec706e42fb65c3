use axum::{Router, routing::{get, patch}};

use crate::state::AppState;
use crate::handlers::user::{
    activate_user, create_user, deactivate_user, delete_user, get_user, list_users,
    update_user, user_statistics,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/statistics/summary", get(user_statistics))
        .route("/users/{id}", get(get_user).patch(update_user).delete(delete_user))
        .route("/users/{id}/activate", patch(activate_user))
        .route("/users/{id}/deactivate", patch(deactivate_user))
        .route_layer(axum::middleware::from_fn(require_auth))
}
