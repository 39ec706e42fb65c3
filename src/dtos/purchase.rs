use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::purchase::{PurchaseOrder, PurchaseOrderItem};

#[derive(Deserialize)]
pub struct PurchaseOrderItemInput {
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_cost: Decimal,
}

#[derive(Deserialize)]
pub struct CreatePurchaseOrderRequest {
    pub order_number: String,
    pub supplier_name: String,
    pub order_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<PurchaseOrderItemInput>,
}

// Supplying `items` replaces the whole set; item-level patching is not a
// thing at this layer.
#[derive(Deserialize)]
pub struct UpdatePurchaseOrderRequest {
    pub order_number: Option<String>,
    pub supplier_name: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<String>,
    pub notes: Option<Option<String>>,
    pub items: Option<Vec<PurchaseOrderItemInput>>,
}

#[derive(Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct PurchaseOrderQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct PurchaseOrderResponse {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}
