use axum::{Router, routing::{get, patch}};

use crate::state::AppState;
use crate::handlers::sale::{
    create_sale, delete_sale, get_sale, list_sales, update_payment, update_sale,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale).patch(update_sale).delete(delete_sale))
        .route("/sales/{id}/payment", patch(update_payment))
        .route_layer(axum::middleware::from_fn(require_auth))
}
