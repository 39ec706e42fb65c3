use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryItem {
    pub id: i64,
    pub item_type: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub minimum_stock_level: Decimal,
    pub current_stock_level: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    /// Low stock is inclusive at the threshold.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock_level <= self.minimum_stock_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(current: &str, minimum: &str) -> InventoryItem {
        InventoryItem {
            id: 1,
            item_type: "feed".to_string(),
            item_name: "Layer mash".to_string(),
            quantity: Decimal::ZERO,
            unit: "kg".to_string(),
            minimum_stock_level: minimum.parse().unwrap(),
            current_stock_level: current.parse().unwrap(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn below_threshold_is_low() {
        assert!(item("5", "10").is_low_stock());
    }

    #[test]
    fn at_threshold_is_low() {
        assert!(item("10", "10").is_low_stock());
    }

    #[test]
    fn above_threshold_is_not_low() {
        assert!(!item("10.01", "10").is_low_stock());
    }
}
