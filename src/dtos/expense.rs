use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateExpenseRequest {
    pub expense_date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateExpenseRequest {
    pub expense_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub notes: Option<Option<String>>,
}

#[derive(Deserialize)]
pub struct ExpenseQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Serialize)]
pub struct TotalExpensesResponse {
    pub total: Decimal,
}
