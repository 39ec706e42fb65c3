use axum::{Router, routing::get};

use crate::state::AppState;
use crate::handlers::expense::{
    create_expense, delete_expense, expenses_by_category, get_expense, list_expenses,
    total_expenses, update_expense,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/by-category", get(expenses_by_category))
        .route("/expenses/total", get(total_expenses))
        .route("/expenses/{id}", get(get_expense).patch(update_expense).delete(delete_expense))
        .route_layer(axum::middleware::from_fn(require_auth))
}
