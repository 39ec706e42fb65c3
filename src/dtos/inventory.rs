use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateInventoryItemRequest {
    pub item_type: String,
    pub item_name: String,
    pub quantity: Option<Decimal>,
    pub unit: String,
    pub minimum_stock_level: Option<Decimal>,
    pub current_stock_level: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateInventoryItemRequest {
    pub item_type: Option<String>,
    pub item_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub minimum_stock_level: Option<Decimal>,
    pub current_stock_level: Option<Decimal>,
    pub notes: Option<Option<String>>,
}

/// Filters on the last_updated timestamp, both bounds inclusive.
#[derive(Deserialize)]
pub struct InventoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct TotalValueResponse {
    pub total: Decimal,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct TypeBreakdown {
    pub item_type: String,
    pub count: i64,
    pub total_quantity: Decimal,
}
