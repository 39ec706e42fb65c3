use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateVehicleRequest {
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
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateVehicleRequest {
    pub vehicle_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub driver_name: Option<String>,
    pub phone: Option<String>,
    pub owner_name: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub total_capacity: Option<Option<i32>>,
    pub petrol_tank_capacity: Option<Option<Decimal>>,
    pub mileage: Option<Option<Decimal>>,
    pub join_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub note: Option<Option<String>>,
}
