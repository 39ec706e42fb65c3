use axum::{Router, routing::get};

use crate::state::AppState;
use crate::handlers::vehicle::{
    create_vehicle, delete_vehicle, get_vehicle, list_vehicles, update_vehicle,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/{id}", get(get_vehicle).patch(update_vehicle).delete(delete_vehicle))
        .route_layer(axum::middleware::from_fn(require_auth))
}
