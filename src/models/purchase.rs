use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrder {
    pub id: i64,
    pub order_number: String,
    pub supplier_name: String,
    pub order_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owned by its order: replaced as a set on update, removed with the order.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrderItem {
    pub id: i64,
    pub purchase_order_id: i64,
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_cost: Decimal,
    pub line_total: Decimal,
}

pub fn line_total(quantity: Decimal, unit_cost: Decimal) -> Decimal {
    quantity * unit_cost
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn line_total_is_quantity_times_unit_cost() {
        assert_eq!(line_total(dec("2"), dec("10")), dec("20"));
        assert_eq!(line_total(dec("3"), dec("5")), dec("15"));
        assert_eq!(line_total(dec("0.5"), dec("7.50")), dec("3.750"));
    }
}
