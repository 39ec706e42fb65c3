use axum::{Router, routing::get};

use crate::state::AppState;
use crate::handlers::inventory::{
    by_type, create_item, delete_item, get_item, list_items, low_stock, total_value,
    update_item,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_items).post(create_item))
        .route("/inventory/low-stock", get(low_stock))
        .route("/inventory/total-value", get(total_value))
        .route("/inventory/by-type", get(by_type))
        .route("/inventory/{id}", get(get_item).patch(update_item).delete(delete_item))
        .route_layer(axum::middleware::from_fn(require_auth))
}
