use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub vehicle_number: String,
    pub vehicle_type: String,
    pub driver_name: String,
    pub phone: String,
    pub owner_name: Option<String>,
    pub address: Option<String>,
    pub total_capacity: Option<i32>,
    pub petrol_tank_capacity: Option<Decimal>,
    pub mileage: Option<Decimal>,
    pub join_date: NaiveDate,
    pub status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
