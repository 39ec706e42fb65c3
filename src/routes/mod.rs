pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod expenses;
pub mod farmers;
pub mod inventory;
pub mod purchases;
pub mod retailers;
pub mod sales;
pub mod settings;
pub mod users;
pub mod vehicles;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(farmers::routes())
        .merge(retailers::routes())
        .merge(vehicles::routes())
        .merge(sales::routes())
        .merge(purchases::routes())
        .merge(inventory::routes())
        .merge(expenses::routes())
        .merge(settings::routes())
        .merge(audit::routes())
        .merge(dashboard::routes())
}
