use axum::{Router, routing::{get, patch}};

use crate::state::AppState;
use crate::handlers::purchase::{
    create_order, delete_order, get_order, list_orders, update_order, update_status,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list_orders).post(create_order))
        .route("/purchases/{id}", get(get_order).patch(update_order).delete(delete_order))
        .route("/purchases/{id}/status", patch(update_status))
        .route_layer(axum::middleware::from_fn(require_auth))
}
