use axum::{extract::{Query, State}, Json};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::dtos::dashboard::{
    CategoryExpenses, DashboardKpis, DateRangeQuery, FinancialSummary, InventorySummary,
    LimitQuery, MonthlyFinancials, MonthsQuery, Period, ProductRevenue, PurchasesSummary,
    TypeCount,
};
use crate::dtos::sale::SaleResponse;
use crate::error::AppError;
use crate::handlers::sale::{SaleRow, SALE_SELECT};
use crate::models::expense::Expense;
use crate::models::inventory::InventoryItem;
use crate::state::AppState;

const DEFAULT_MONTHS: u32 = 6;

pub async fn kpis(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<DateRangeQuery>,
) -> Result<Json<DashboardKpis>, AppError> {
    let period = resolve_period(&q);

    let total_revenue = revenue_between(&db_pool, period.start_date, period.end_date).await?;
    let total_expenses = expenses_between(&db_pool, period.start_date, period.end_date).await?;

    let total_vehicles = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM vehicles WHERE status = 'active'",
    )
    .fetch_one(&db_pool)
    .await?;

    let total_sales = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sales WHERE sale_date >= $1 AND sale_date <= $2",
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(DashboardKpis {
        profit: total_revenue - total_expenses,
        total_revenue,
        total_expenses,
        total_vehicles,
        total_sales,
        period,
    }))
}

pub async fn revenue_by_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<DateRangeQuery>,
) -> Result<Json<Vec<ProductRevenue>>, AppError> {
    let period = resolve_period(&q);

    let rows = sqlx::query_as::<_, ProductRevenue>(
        r#"SELECT product_type,
            COALESCE(SUM(total_amount), 0) AS revenue,
            COUNT(*) AS count
        FROM sales
        WHERE sale_date >= $1 AND sale_date <= $2
        GROUP BY product_type
        ORDER BY revenue DESC"#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(rows))
}

pub async fn expenses_by_category(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<DateRangeQuery>,
) -> Result<Json<Vec<CategoryExpenses>>, AppError> {
    let period = resolve_period(&q);

    let rows = sqlx::query_as::<_, CategoryExpenses>(
        r#"SELECT category,
            COALESCE(SUM(amount), 0) AS amount,
            COUNT(*) AS count
        FROM expenses
        WHERE expense_date >= $1 AND expense_date <= $2
        GROUP BY category
        ORDER BY amount DESC"#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(rows))
}

pub async fn recent_sales(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<SaleResponse>>, AppError> {
    let sql = format!("{SALE_SELECT} ORDER BY s.sale_date DESC, s.created_at DESC LIMIT $1");
    let sales = sqlx::query_as::<_, SaleRow>(&sql)
        .bind(q.limit.unwrap_or(10))
        .fetch_all(&db_pool)
        .await?;

    Ok(Json(sales.into_iter().map(SaleRow::into_response).collect()))
}

pub async fn recent_expenses(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = sqlx::query_as::<_, Expense>(
        "SELECT * FROM expenses ORDER BY expense_date DESC, created_at DESC LIMIT $1",
    )
    .bind(q.limit.unwrap_or(10))
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(expenses))
}

pub async fn monthly_revenue_vs_expenses(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<MonthsQuery>,
) -> Result<Json<Vec<MonthlyFinancials>>, AppError> {
    let months = q.months.unwrap_or(DEFAULT_MONTHS).clamp(1, 24);
    let today = Utc::now().date_naive();

    let mut series = Vec::with_capacity(months as usize);
    for back in (0..months).rev() {
        let start = add_months(today, -(back as i32));
        let end = month_end(start);

        let revenue = revenue_between(&db_pool, start, end).await?;
        let expenses = expenses_between(&db_pool, start, end).await?;

        series.push(MonthlyFinancials {
            month: month_label(start),
            profit: revenue - expenses,
            revenue,
            expenses,
        });
    }

    Ok(Json(series))
}

pub async fn financial_summary(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<MonthsQuery>,
) -> Result<Json<FinancialSummary>, AppError> {
    let months = q.months.unwrap_or(DEFAULT_MONTHS).clamp(1, 24);
    let today = Utc::now().date_naive();
    let start = add_months(today, -(months as i32 - 1));

    let total_revenue = revenue_between(&db_pool, start, today).await?;
    let total_expenses = expenses_between(&db_pool, start, today).await?;
    let total_profit = total_revenue - total_expenses;
    let month_count = Decimal::from(months);

    Ok(Json(FinancialSummary {
        total_revenue,
        total_expenses,
        total_profit,
        avg_monthly_profit: (total_profit / month_count).round_dp(2),
        revenue_per_month: (total_revenue / month_count).round_dp(2),
        expense_per_month: (total_expenses / month_count).round_dp(2),
        profit_margin: percentage(total_profit, total_revenue),
        roi: percentage(total_profit, total_expenses),
        period: Period { start_date: start, end_date: today },
        months,
    }))
}

pub async fn inventory_summary(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<InventorySummary>, AppError> {
    let items = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items")
        .fetch_all(&db_pool)
        .await?;

    Ok(Json(summarize_inventory(&items)))
}

pub async fn purchases_summary(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<DateRangeQuery>,
) -> Result<Json<PurchasesSummary>, AppError> {
    let period = resolve_period(&q);

    let total_orders = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM purchase_orders WHERE order_date >= $1 AND order_date <= $2",
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_one(&db_pool)
    .await?;

    let pending_orders = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM purchase_orders
        WHERE order_date >= $1 AND order_date <= $2 AND status = 'pending'"#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_one(&db_pool)
    .await?;

    let total_value = sqlx::query_scalar::<_, Decimal>(
        r#"SELECT COALESCE(SUM(total_amount), 0) FROM purchase_orders
        WHERE order_date >= $1 AND order_date <= $2"#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(PurchasesSummary { total_orders, pending_orders, total_value, period }))
}

async fn revenue_between(db_pool: &PgPool, start: NaiveDate, end: NaiveDate) -> Result<Decimal, AppError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(total_amount), 0) FROM sales WHERE sale_date >= $1 AND sale_date <= $2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(db_pool)
    .await?;
    Ok(total)
}

async fn expenses_between(db_pool: &PgPool, start: NaiveDate, end: NaiveDate) -> Result<Decimal, AppError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE expense_date >= $1 AND expense_date <= $2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(db_pool)
    .await?;
    Ok(total)
}

// The reporting window defaults to the current month
fn resolve_period(q: &DateRangeQuery) -> Period {
    let today = Utc::now().date_naive();
    Period {
        start_date: q.start_date.unwrap_or_else(|| month_start(today)),
        end_date: q.end_date.unwrap_or(today),
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month `delta` months away from `date`'s month.
fn add_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let months = date.year() * 12 + date.month0() as i32 + delta;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

fn month_end(date: NaiveDate) -> NaiveDate {
    add_months(date, 1).pred_opt().unwrap_or(date)
}

fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part / whole * Decimal::from(100)).round_dp(2)
    }
}

fn summarize_inventory(items: &[InventoryItem]) -> InventorySummary {
    use std::collections::BTreeMap;

    let mut by_type: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_value = Decimal::ZERO;
    let mut low_stock_items = 0;

    for item in items {
        *by_type.entry(item.item_type.clone()).or_default() += 1;
        total_value += item.current_stock_level;
        if item.is_low_stock() {
            low_stock_items += 1;
        }
    }

    InventorySummary {
        total_items: items.len(),
        low_stock_items,
        total_value,
        by_type: by_type
            .into_iter()
            .map(|(item_type, count)| TypeCount { item_type, count })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_months_crosses_year_boundaries() {
        assert_eq!(add_months(date(2026, 8, 7), 0), date(2026, 8, 1));
        assert_eq!(add_months(date(2026, 8, 7), -5), date(2026, 3, 1));
        assert_eq!(add_months(date(2026, 2, 15), -3), date(2025, 11, 1));
        assert_eq!(add_months(date(2025, 12, 31), 1), date(2026, 1, 1));
    }

    #[test]
    fn month_end_handles_short_and_leap_months() {
        assert_eq!(month_end(date(2026, 8, 7)), date(2026, 8, 31));
        assert_eq!(month_end(date(2026, 2, 1)), date(2026, 2, 28));
        assert_eq!(month_end(date(2028, 2, 10)), date(2028, 2, 29));
    }

    #[test]
    fn month_label_formats_short_month_and_year() {
        assert_eq!(month_label(date(2026, 8, 1)), "Aug 2026");
        assert_eq!(month_label(date(2025, 12, 1)), "Dec 2025");
    }

    #[test]
    fn percentage_rounds_to_two_decimals_and_guards_zero() {
        assert_eq!(percentage(dec("50"), dec("150")), dec("33.33"));
        assert_eq!(percentage(dec("25"), dec("100")), dec("25.00"));
        assert_eq!(percentage(dec("10"), Decimal::ZERO), Decimal::ZERO);
    }

    fn item(item_type: &str, current: &str, minimum: &str) -> InventoryItem {
        InventoryItem {
            id: 0,
            item_type: item_type.to_string(),
            item_name: "x".to_string(),
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
    fn inventory_summary_counts_low_stock_inclusively() {
        let items = vec![
            item("feed", "5", "10"),   // low
            item("feed", "10", "10"),  // low, boundary
            item("medicine", "11", "10"),
        ];

        let summary = summarize_inventory(&items);

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.low_stock_items, 2);
        assert_eq!(summary.total_value, dec("26"));
        assert_eq!(
            summary.by_type,
            vec![
                TypeCount { item_type: "feed".to_string(), count: 2 },
                TypeCount { item_type: "medicine".to_string(), count: 1 },
            ]
        );
    }
}
