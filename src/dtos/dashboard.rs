use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct MonthsQuery {
    pub months: Option<u32>,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Serialize)]
pub struct DashboardKpis {
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub profit: Decimal,
    pub total_vehicles: i64,
    pub total_sales: i64,
    pub period: Period,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct ProductRevenue {
    pub product_type: String,
    pub revenue: Decimal,
    pub count: i64,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct CategoryExpenses {
    pub category: String,
    pub amount: Decimal,
    pub count: i64,
}

#[derive(Serialize)]
pub struct MonthlyFinancials {
    pub month: String,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
}

#[derive(Serialize)]
pub struct FinancialSummary {
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub total_profit: Decimal,
    pub avg_monthly_profit: Decimal,
    pub revenue_per_month: Decimal,
    pub expense_per_month: Decimal,
    /// Percentages, rounded to two decimal places.
    pub profit_margin: Decimal,
    pub roi: Decimal,
    pub period: Period,
    pub months: u32,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TypeCount {
    pub item_type: String,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InventorySummary {
    pub total_items: usize,
    pub low_stock_items: usize,
    /// Sum of current stock levels; a quantity, not a monetary amount.
    pub total_value: Decimal,
    pub by_type: Vec<TypeCount>,
}

#[derive(Serialize)]
pub struct PurchasesSummary {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub total_value: Decimal,
    pub period: Period,
}
