use axum::{extract::{Path, Query, State}, Extension, Json};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::audit::AuditEntry;
use crate::dtos::sale::{
    CreateSaleRequest, RetailerRef, SaleQuery, SaleResponse, UpdatePaymentRequest,
    UpdateSaleRequest,
};
use crate::error::{unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::sale::{sale_total, Sale};
use crate::state::AppState;

const PRODUCT_TYPES: &[&str] = &["eggs", "meat", "chicks", "other"];
const PAYMENT_STATUSES: &[&str] = &["paid", "pending", "partial"];

// Retailer is a weak reference: LEFT JOIN, dangling ids resolve to NULL
pub(crate) const SALE_SELECT: &str =
    "SELECT s.*, r.name AS retailer_name FROM sales s LEFT JOIN retailers r ON r.id = s.retailer_id";

#[derive(sqlx::FromRow)]
pub(crate) struct SaleRow {
    #[sqlx(flatten)]
    pub(crate) sale: Sale,
    pub(crate) retailer_name: Option<String>,
}

impl SaleRow {
    pub(crate) fn into_response(self) -> SaleResponse {
        let SaleRow { sale, retailer_name } = self;
        let retailer = match (sale.retailer_id, retailer_name) {
            (Some(id), Some(name)) => Some(RetailerRef { id, name }),
            _ => None,
        };
        SaleResponse { sale, retailer }
    }
}

pub async fn create_sale(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    if req.invoice_number.trim().is_empty() {
        return Err(AppError::validation("Invoice number is required"));
    }
    if !PRODUCT_TYPES.contains(&req.product_type.as_str()) {
        return Err(AppError::validation("Invalid product type"));
    }
    if req.quantity < Decimal::ZERO {
        return Err(AppError::validation("Quantity cannot be negative"));
    }
    if req.unit_price < Decimal::ZERO {
        return Err(AppError::validation("Unit price cannot be negative"));
    }
    let payment_status = req.payment_status.unwrap_or_else(|| "pending".to_string());
    if !PAYMENT_STATUSES.contains(&payment_status.as_str()) {
        return Err(AppError::validation("Invalid payment status"));
    }

    let invoice_number = req.invoice_number.trim();
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM sales WHERE invoice_number = $1)",
    )
    .bind(invoice_number)
    .fetch_one(&db_pool)
    .await?;
    if exists {
        return Err(AppError::conflict(format!(
            "Sale with invoice number {invoice_number} already exists"
        )));
    }

    // Client-supplied totals are never trusted
    let total_amount = sale_total(req.quantity, req.unit_price);
    let amount_received = req.amount_received.unwrap_or(Decimal::ZERO);

    let sale = sqlx::query_as::<_, Sale>(
        r#"INSERT INTO sales
            (invoice_number, customer_name, sale_date, product_type, quantity, unit,
             unit_price, total_amount, payment_status, amount_received, notes, retailer_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *"#,
    )
    .bind(invoice_number)
    .bind(&req.customer_name)
    .bind(req.sale_date)
    .bind(&req.product_type)
    .bind(req.quantity)
    .bind(&req.unit)
    .bind(req.unit_price)
    .bind(total_amount)
    .bind(&payment_status)
    .bind(amount_received)
    .bind(&req.notes)
    .bind(req.retailer_id)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| {
        if unique_violation(&e, "sales_invoice_number_key") {
            AppError::conflict(format!(
                "Sale with invoice number {invoice_number} already exists"
            ))
        } else {
            AppError::db(e)
        }
    })?;

    audit
        .record(AuditEntry::by(&auth, "CREATE", "sales").for_id(sale.id).with_new(&sale))
        .await;

    let response = fetch_sale_response(&db_pool, sale.id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_sale(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SaleResponse>, AppError> {
    fetch_sale_response(&db_pool, id).await.map(Json)
}

pub async fn list_sales(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<SaleQuery>,
) -> Result<Json<Vec<SaleResponse>>, AppError> {
    let mut sql = String::from(SALE_SELECT);
    sql.push_str(" WHERE 1=1");
    let mut n = 0;

    if q.start_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND s.sale_date >= ${n}"));
    }
    if q.end_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND s.sale_date <= ${n}"));
    }
    if q.customer.is_some() {
        n += 1;
        sql.push_str(&format!(" AND s.customer_name ILIKE ${n}"));
    }
    if q.product_type.is_some() {
        n += 1;
        sql.push_str(&format!(" AND s.product_type = ${n}"));
    }
    if q.payment_status.is_some() {
        n += 1;
        sql.push_str(&format!(" AND s.payment_status = ${n}"));
    }
    sql.push_str(" ORDER BY s.sale_date DESC, s.id DESC");

    let mut query = sqlx::query_as::<_, SaleRow>(&sql);
    if let Some(start) = q.start_date {
        query = query.bind(start);
    }
    if let Some(end) = q.end_date {
        query = query.bind(end);
    }
    if let Some(ref customer) = q.customer {
        query = query.bind(format!("%{customer}%"));
    }
    if let Some(ref product_type) = q.product_type {
        query = query.bind(product_type.clone());
    }
    if let Some(ref payment_status) = q.payment_status {
        query = query.bind(payment_status.clone());
    }

    let sales = query.fetch_all(&db_pool).await?;
    Ok(Json(sales.into_iter().map(SaleRow::into_response).collect()))
}

pub async fn update_sale(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSaleRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    if let Some(ref product_type) = req.product_type {
        if !PRODUCT_TYPES.contains(&product_type.as_str()) {
            return Err(AppError::validation("Invalid product type"));
        }
    }
    if let Some(ref payment_status) = req.payment_status {
        if !PAYMENT_STATUSES.contains(&payment_status.as_str()) {
            return Err(AppError::validation("Invalid payment status"));
        }
    }
    if matches!(req.quantity, Some(q) if q < Decimal::ZERO) {
        return Err(AppError::validation("Quantity cannot be negative"));
    }
    if matches!(req.unit_price, Some(p) if p < Decimal::ZERO) {
        return Err(AppError::validation("Unit price cannot be negative"));
    }

    let sale = fetch_sale(&db_pool, id).await?;

    if let Some(ref new_invoice) = req.invoice_number {
        let new_invoice = new_invoice.trim();
        if new_invoice.is_empty() {
            return Err(AppError::validation("Invoice number is required"));
        }
        if new_invoice != sale.invoice_number {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM sales WHERE invoice_number = $1 AND id <> $2)",
            )
            .bind(new_invoice)
            .bind(id)
            .fetch_one(&db_pool)
            .await?;
            if taken {
                return Err(AppError::conflict(format!(
                    "Sale with invoice number {new_invoice} already exists"
                )));
            }
        }
    }

    let before = sale.clone();
    let merged = merge_update(sale, req);

    let updated = sqlx::query_as::<_, Sale>(
        r#"UPDATE sales SET
            invoice_number = $2, customer_name = $3, sale_date = $4, product_type = $5,
            quantity = $6, unit = $7, unit_price = $8, total_amount = $9,
            payment_status = $10, amount_received = $11, notes = $12, retailer_id = $13,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(merged.invoice_number.trim())
    .bind(&merged.customer_name)
    .bind(merged.sale_date)
    .bind(&merged.product_type)
    .bind(merged.quantity)
    .bind(&merged.unit)
    .bind(merged.unit_price)
    .bind(merged.total_amount)
    .bind(&merged.payment_status)
    .bind(merged.amount_received)
    .bind(&merged.notes)
    .bind(merged.retailer_id)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| {
        if unique_violation(&e, "sales_invoice_number_key") {
            AppError::conflict("Invoice number already exists")
        } else {
            AppError::db(e)
        }
    })?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "sales")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated),
        )
        .await;

    fetch_sale_response(&db_pool, id).await.map(Json)
}

pub async fn update_payment(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    if !PAYMENT_STATUSES.contains(&req.payment_status.as_str()) {
        return Err(AppError::validation("Invalid payment status"));
    }

    let before = fetch_sale(&db_pool, id).await?;

    // amount_received is overwritten only when supplied; no received <= total
    // check, matching how the books are actually kept
    let updated = sqlx::query_as::<_, Sale>(
        r#"UPDATE sales SET
            payment_status = $2,
            amount_received = COALESCE($3, amount_received),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&req.payment_status)
    .bind(req.amount_received)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "sales")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated)
                .describe("Payment status updated"),
        )
        .await;

    fetch_sale_response(&db_pool, id).await.map(Json)
}

pub async fn delete_sale(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let sale = fetch_sale(&db_pool, id).await?;

    sqlx::query("DELETE FROM sales WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "sales").for_id(id).with_old(&sale))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_sale(db_pool: &PgPool, id: i64) -> Result<Sale, AppError> {
    sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Sale with ID {id} not found")))
}

async fn fetch_sale_response(db_pool: &PgPool, id: i64) -> Result<SaleResponse, AppError> {
    let sql = format!("{SALE_SELECT} WHERE s.id = $1");
    sqlx::query_as::<_, SaleRow>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .map(SaleRow::into_response)
        .ok_or_else(|| AppError::not_found(format!("Sale with ID {id} not found")))
}

fn merge_update(mut sale: Sale, req: UpdateSaleRequest) -> Sale {
    if let Some(invoice_number) = req.invoice_number {
        sale.invoice_number = invoice_number;
    }
    if let Some(customer_name) = req.customer_name {
        sale.customer_name = customer_name;
    }
    if let Some(sale_date) = req.sale_date {
        sale.sale_date = sale_date;
    }
    if let Some(product_type) = req.product_type {
        sale.product_type = product_type;
    }
    if let Some(unit) = req.unit {
        sale.unit = unit;
    }
    if let Some(payment_status) = req.payment_status {
        sale.payment_status = payment_status;
    }
    if let Some(amount_received) = req.amount_received {
        sale.amount_received = amount_received;
    }
    if let Some(notes) = req.notes {
        sale.notes = notes;
    }
    if let Some(retailer_id) = req.retailer_id {
        sale.retailer_id = retailer_id;
    }

    // The total follows its factors; untouched factors leave it as-is
    let recompute = req.quantity.is_some() || req.unit_price.is_some();
    if let Some(quantity) = req.quantity {
        sale.quantity = quantity;
    }
    if let Some(unit_price) = req.unit_price {
        sale.unit_price = unit_price;
    }
    if recompute {
        sale.total_amount = sale_total(sale.quantity, sale.unit_price);
    }

    sale
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn base_sale() -> Sale {
        Sale {
            id: 1,
            invoice_number: "INV-T1".to_string(),
            customer_name: "City Mart".to_string(),
            sale_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            product_type: "eggs".to_string(),
            quantity: dec("10"),
            unit: Some("tray".to_string()),
            unit_price: dec("5.00"),
            total_amount: dec("50.00"),
            payment_status: "pending".to_string(),
            amount_received: Decimal::ZERO,
            notes: None,
            retailer_id: Some(3),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn empty_update() -> UpdateSaleRequest {
        UpdateSaleRequest {
            invoice_number: None,
            customer_name: None,
            sale_date: None,
            product_type: None,
            quantity: None,
            unit: None,
            unit_price: None,
            payment_status: None,
            amount_received: None,
            notes: None,
            retailer_id: None,
        }
    }

    #[test]
    fn quantity_change_recomputes_total() {
        let merged = merge_update(
            base_sale(),
            UpdateSaleRequest { quantity: Some(dec("20")), ..empty_update() },
        );
        assert_eq!(merged.total_amount, dec("100.00"));
    }

    #[test]
    fn unit_price_change_recomputes_total() {
        let merged = merge_update(
            base_sale(),
            UpdateSaleRequest { unit_price: Some(dec("7.50")), ..empty_update() },
        );
        assert_eq!(merged.total_amount, dec("75.000"));
    }

    #[test]
    fn unrelated_update_preserves_total() {
        let merged = merge_update(
            base_sale(),
            UpdateSaleRequest { customer_name: Some("Town Mart".to_string()), ..empty_update() },
        );
        assert_eq!(merged.total_amount, dec("50.00"));
        assert_eq!(merged.customer_name, "Town Mart");
    }

    #[test]
    fn retailer_reference_can_be_cleared() {
        let merged = merge_update(
            base_sale(),
            UpdateSaleRequest { retailer_id: Some(None), ..empty_update() },
        );
        assert_eq!(merged.retailer_id, None);
    }

    #[test]
    fn payment_fields_merge_without_touching_total() {
        let merged = merge_update(
            base_sale(),
            UpdateSaleRequest {
                payment_status: Some("partial".to_string()),
                amount_received: Some(dec("25.00")),
                ..empty_update()
            },
        );
        assert_eq!(merged.payment_status, "partial");
        assert_eq!(merged.amount_received, dec("25.00"));
        assert_eq!(merged.total_amount, dec("50.00"));
    }
}
