use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: i64,
    pub invoice_number: String,
    pub customer_name: String,
    pub sale_date: NaiveDate,
    pub product_type: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub amount_received: Decimal,
    pub notes: Option<String>,
    pub retailer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The stored total is always derived from these two factors, never taken
/// from client input.
pub fn sale_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity * unit_price
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn total_is_quantity_times_unit_price() {
        assert_eq!(sale_total(dec("10"), dec("5.00")), dec("50.00"));
        assert_eq!(sale_total(dec("2.5"), dec("4.20")), dec("10.500"));
        assert_eq!(sale_total(Decimal::ZERO, dec("99.99")), Decimal::ZERO);
    }

    #[test]
    fn decimal_arithmetic_does_not_drift() {
        // 0.1 + 0.2 style sums stay exact in fixed-point
        let total: Decimal = (0..100).map(|_| sale_total(dec("0.1"), dec("0.1"))).sum();
        assert_eq!(total, dec("1.00"));
    }
}
