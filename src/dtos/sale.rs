use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::sale::Sale;

#[derive(Deserialize)]
pub struct CreateSaleRequest {
    pub invoice_number: String,
    pub customer_name: String,
    pub sale_date: NaiveDate,
    pub product_type: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub payment_status: Option<String>,
    pub amount_received: Option<Decimal>,
    pub notes: Option<String>,
    pub retailer_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateSaleRequest {
    pub invoice_number: Option<String>,
    pub customer_name: Option<String>,
    pub sale_date: Option<NaiveDate>,
    pub product_type: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<Option<String>>,
    pub unit_price: Option<Decimal>,
    pub payment_status: Option<String>,
    pub amount_received: Option<Decimal>,
    pub notes: Option<Option<String>>,
    pub retailer_id: Option<Option<i64>>,
}

#[derive(Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: String,
    pub amount_received: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct SaleQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer: Option<String>,
    pub product_type: Option<String>,
    pub payment_status: Option<String>,
}

/// The weak retailer reference resolved for display; a dangling id shows
/// up as `None`.
#[derive(Serialize)]
pub struct RetailerRef {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize)]
pub struct SaleResponse {
    #[serde(flatten)]
    pub sale: Sale,
    pub retailer: Option<RetailerRef>,
}
