use axum::{Router, routing::get};

use crate::state::AppState;
use crate::handlers::farmer::{create_farmer, delete_farmer, get_farmer, list_farmers, update_farmer};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/farmers", get(list_farmers).post(create_farmer))
        .route("/farmers/{id}", get(get_farmer).patch(update_farmer).delete(delete_farmer))
        .route_layer(axum::middleware::from_fn(require_auth))
}
