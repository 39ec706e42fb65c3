use axum::{Router, routing::{get, put}};

use crate::state::AppState;
use crate::handlers::setting::{
    create_setting, delete_setting, get_app_settings, get_by_category, get_setting,
    list_settings, update_app_settings, update_setting, upsert_setting,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(list_settings).post(create_setting))
        .route("/settings/app", get(get_app_settings).put(update_app_settings))
        .route("/settings/category/{category}", get(get_by_category))
        .route("/settings/key/{key}", put(upsert_setting))
        .route("/settings/{key}", get(get_setting).patch(update_setting).delete(delete_setting))
        .route_layer(axum::middleware::from_fn(require_auth))
}
