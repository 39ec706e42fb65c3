use axum::{Router, routing::get};

use crate::state::AppState;
use crate::handlers::retailer::{
    create_retailer, delete_retailer, get_retailer, list_retailers, update_retailer,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/retailers", get(list_retailers).post(create_retailer))
        .route("/retailers/{id}", get(get_retailer).patch(update_retailer).delete(delete_retailer))
        .route_layer(axum::middleware::from_fn(require_auth))
}
