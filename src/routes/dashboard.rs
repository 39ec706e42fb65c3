use axum::{Router, routing::get};

use crate::state::AppState;
use crate::handlers::dashboard::{
    expenses_by_category, financial_summary, inventory_summary, kpis,
    monthly_revenue_vs_expenses, purchases_summary, recent_expenses, recent_sales,
    revenue_by_product,
};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/kpis", get(kpis))
        .route("/dashboard/revenue-by-product", get(revenue_by_product))
        .route("/dashboard/expenses-by-category", get(expenses_by_category))
        .route("/dashboard/recent-sales", get(recent_sales))
        .route("/dashboard/recent-expenses", get(recent_expenses))
        .route("/dashboard/monthly-revenue-vs-expenses", get(monthly_revenue_vs_expenses))
        .route("/dashboard/financial-summary", get(financial_summary))
        .route("/dashboard/inventory-summary", get(inventory_summary))
        .route("/dashboard/purchases-summary", get(purchases_summary))
        .route_layer(axum::middleware::from_fn(require_auth))
}
