use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Expense {
    pub id: i64,
    pub expense_date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const CATEGORIES: &[&str] = &[
    "feed", "labor", "medicine", "utilities",
    "equipment", "maintenance", "transportation", "other",
];

pub const PAYMENT_METHODS: &[&str] = &["cash", "bank_transfer", "check", "credit_card"];
