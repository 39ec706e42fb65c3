use std::collections::HashMap;

use axum::{extract::{Path, Query, State}, Extension, Json};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::audit::AuditEntry;
use crate::dtos::purchase::{
    CreatePurchaseOrderRequest, PurchaseOrderItemInput, PurchaseOrderQuery,
    PurchaseOrderResponse, UpdateOrderStatusRequest, UpdatePurchaseOrderRequest,
};
use crate::error::{unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::purchase::{line_total, PurchaseOrder, PurchaseOrderItem};
use crate::state::AppState;

// Terminal-ish states are not enforced: any status may be set over any other
const ORDER_STATUSES: &[&str] = &["pending", "received", "cancelled"];

fn items_total(items: &[PurchaseOrderItemInput]) -> Decimal {
    items.iter().map(|i| line_total(i.quantity, i.unit_cost)).sum()
}

fn validate_items(items: &[PurchaseOrderItemInput]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::validation("Purchase order must contain at least one item"));
    }
    for item in items {
        if item.description.trim().is_empty() {
            return Err(AppError::validation("Item description is required"));
        }
        if item.quantity < Decimal::ZERO {
            return Err(AppError::validation("Item quantity cannot be negative"));
        }
        if item.unit_cost < Decimal::ZERO {
            return Err(AppError::validation("Item unit cost cannot be negative"));
        }
    }
    Ok(())
}

pub async fn create_order(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePurchaseOrderRequest>,
) -> Result<(StatusCode, Json<PurchaseOrderResponse>), AppError> {
    if req.order_number.trim().is_empty() {
        return Err(AppError::validation("Order number is required"));
    }
    let status = req.status.unwrap_or_else(|| "pending".to_string());
    if !ORDER_STATUSES.contains(&status.as_str()) {
        return Err(AppError::validation("Invalid order status"));
    }
    validate_items(&req.items)?;

    let order_number = req.order_number.trim();
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE order_number = $1)",
    )
    .bind(order_number)
    .fetch_one(&db_pool)
    .await?;
    if exists {
        return Err(AppError::conflict(format!(
            "Purchase order with number {order_number} already exists"
        )));
    }

    let total_amount = items_total(&req.items);

    // Order and items land together or not at all
    let mut tx = db_pool.begin().await?;

    let order = sqlx::query_as::<_, PurchaseOrder>(
        r#"INSERT INTO purchase_orders
            (order_number, supplier_name, order_date, due_date, status, total_amount, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *"#,
    )
    .bind(order_number)
    .bind(&req.supplier_name)
    .bind(req.order_date)
    .bind(req.due_date)
    .bind(&status)
    .bind(total_amount)
    .bind(&req.notes)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if unique_violation(&e, "purchase_orders_order_number_key") {
            AppError::conflict(format!(
                "Purchase order with number {order_number} already exists"
            ))
        } else {
            AppError::db(e)
        }
    })?;

    let mut items = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let stored = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"INSERT INTO purchase_order_items
                (purchase_order_id, description, quantity, unit, unit_cost, line_total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *"#,
        )
        .bind(order.id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.unit_cost)
        .bind(line_total(item.quantity, item.unit_cost))
        .fetch_one(&mut *tx)
        .await?;
        items.push(stored);
    }

    tx.commit().await?;

    let response = PurchaseOrderResponse { order, items };

    audit
        .record(
            AuditEntry::by(&auth, "CREATE", "purchase_orders")
                .for_id(response.order.id)
                .with_new(&response),
        )
        .await;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_order(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PurchaseOrderResponse>, AppError> {
    fetch_order_response(&db_pool, id).await.map(Json)
}

pub async fn list_orders(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<PurchaseOrderQuery>,
) -> Result<Json<Vec<PurchaseOrderResponse>>, AppError> {
    let mut sql = String::from("SELECT * FROM purchase_orders WHERE 1=1");
    let mut n = 0;

    if q.start_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND order_date >= ${n}"));
    }
    if q.end_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND order_date <= ${n}"));
    }
    if q.supplier.is_some() {
        n += 1;
        sql.push_str(&format!(" AND supplier_name ILIKE ${n}"));
    }
    if q.status.is_some() {
        n += 1;
        sql.push_str(&format!(" AND status = ${n}"));
    }
    sql.push_str(" ORDER BY order_date DESC, id DESC");

    let mut query = sqlx::query_as::<_, PurchaseOrder>(&sql);
    if let Some(start) = q.start_date {
        query = query.bind(start);
    }
    if let Some(end) = q.end_date {
        query = query.bind(end);
    }
    if let Some(ref supplier) = q.supplier {
        query = query.bind(format!("%{supplier}%"));
    }
    if let Some(ref status) = q.status {
        query = query.bind(status.clone());
    }

    let orders = query.fetch_all(&db_pool).await?;

    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let all_items = sqlx::query_as::<_, PurchaseOrderItem>(
        "SELECT * FROM purchase_order_items WHERE purchase_order_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(&db_pool)
    .await?;

    let mut by_order: HashMap<i64, Vec<PurchaseOrderItem>> = HashMap::new();
    for item in all_items {
        by_order.entry(item.purchase_order_id).or_default().push(item);
    }

    Ok(Json(
        orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                PurchaseOrderResponse { order, items }
            })
            .collect(),
    ))
}

pub async fn update_order(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(mut req): Json<UpdatePurchaseOrderRequest>,
) -> Result<Json<PurchaseOrderResponse>, AppError> {
    if let Some(ref status) = req.status {
        if !ORDER_STATUSES.contains(&status.as_str()) {
            return Err(AppError::validation("Invalid order status"));
        }
    }
    let new_items = req.items.take();
    if let Some(ref items) = new_items {
        validate_items(items)?;
    }

    let order = fetch_order(&db_pool, id).await?;

    if let Some(ref new_number) = req.order_number {
        let new_number = new_number.trim();
        if new_number.is_empty() {
            return Err(AppError::validation("Order number is required"));
        }
        if new_number != order.order_number {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE order_number = $1 AND id <> $2)",
            )
            .bind(new_number)
            .bind(id)
            .fetch_one(&db_pool)
            .await?;
            if taken {
                return Err(AppError::conflict(format!(
                    "Purchase order with number {new_number} already exists"
                )));
            }
        }
    }

    let before = fetch_order_response(&db_pool, id).await?;
    let mut merged = merge_update(order, req);

    let mut tx = db_pool.begin().await?;

    // Items are replaced as a whole set; the stored total follows the new set
    if let Some(ref items) = new_items {
        sqlx::query("DELETE FROM purchase_order_items WHERE purchase_order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                r#"INSERT INTO purchase_order_items
                    (purchase_order_id, description, quantity, unit, unit_cost, line_total)
                VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(&item.unit)
            .bind(item.unit_cost)
            .bind(line_total(item.quantity, item.unit_cost))
            .execute(&mut *tx)
            .await?;
        }

        merged.total_amount = items_total(items);
    }

    sqlx::query(
        r#"UPDATE purchase_orders SET
            order_number = $2, supplier_name = $3, order_date = $4, due_date = $5,
            status = $6, total_amount = $7, notes = $8, updated_at = NOW()
        WHERE id = $1"#,
    )
    .bind(id)
    .bind(merged.order_number.trim())
    .bind(&merged.supplier_name)
    .bind(merged.order_date)
    .bind(merged.due_date)
    .bind(&merged.status)
    .bind(merged.total_amount)
    .bind(&merged.notes)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if unique_violation(&e, "purchase_orders_order_number_key") {
            AppError::conflict("Order number already exists")
        } else {
            AppError::db(e)
        }
    })?;

    tx.commit().await?;

    let response = fetch_order_response(&db_pool, id).await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "purchase_orders")
                .for_id(id)
                .with_old(&before)
                .with_new(&response),
        )
        .await;

    Ok(Json(response))
}

pub async fn update_status(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<PurchaseOrderResponse>, AppError> {
    if !ORDER_STATUSES.contains(&req.status.as_str()) {
        return Err(AppError::validation("Invalid order status"));
    }

    let before = fetch_order(&db_pool, id).await?;

    sqlx::query("UPDATE purchase_orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(&req.status)
        .execute(&db_pool)
        .await?;

    let response = fetch_order_response(&db_pool, id).await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "purchase_orders")
                .for_id(id)
                .with_old(&before)
                .with_new(&response.order)
                .describe(format!("Status changed from {} to {}", before.status, req.status)),
        )
        .await;

    Ok(Json(response))
}

pub async fn delete_order(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let order = fetch_order_response(&db_pool, id).await?;

    // ON DELETE CASCADE takes the items with the order
    sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "purchase_orders").for_id(id).with_old(&order))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_order(db_pool: &PgPool, id: i64) -> Result<PurchaseOrder, AppError> {
    sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = $1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Purchase order with ID {id} not found")))
}

async fn fetch_order_response(db_pool: &PgPool, id: i64) -> Result<PurchaseOrderResponse, AppError> {
    let order = fetch_order(db_pool, id).await?;
    let items = sqlx::query_as::<_, PurchaseOrderItem>(
        "SELECT * FROM purchase_order_items WHERE purchase_order_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    Ok(PurchaseOrderResponse { order, items })
}

fn merge_update(mut order: PurchaseOrder, req: UpdatePurchaseOrderRequest) -> PurchaseOrder {
    if let Some(order_number) = req.order_number {
        order.order_number = order_number;
    }
    if let Some(supplier_name) = req.supplier_name {
        order.supplier_name = supplier_name;
    }
    if let Some(order_date) = req.order_date {
        order.order_date = order_date;
    }
    if let Some(due_date) = req.due_date {
        order.due_date = due_date;
    }
    if let Some(status) = req.status {
        order.status = status;
    }
    if let Some(notes) = req.notes {
        order.notes = notes;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(quantity: &str, unit_cost: &str) -> PurchaseOrderItemInput {
        PurchaseOrderItemInput {
            description: "Broiler starter feed".to_string(),
            quantity: dec(quantity),
            unit: "bag".to_string(),
            unit_cost: dec(unit_cost),
        }
    }

    fn base_order() -> PurchaseOrder {
        PurchaseOrder {
            id: 1,
            order_number: "PO-T1".to_string(),
            supplier_name: "AgriFeed Ltd".to_string(),
            order_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            due_date: None,
            status: "pending".to_string(),
            total_amount: dec("35.00"),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn order_total_is_sum_of_line_totals() {
        let items = [item("2", "10"), item("3", "5")];
        assert_eq!(items_total(&items), dec("35"));
    }

    #[test]
    fn empty_item_set_is_rejected() {
        assert!(validate_items(&[]).is_err());
    }

    #[test]
    fn negative_quantity_is_rejected() {
        assert!(validate_items(&[item("-1", "10")]).is_err());
    }

    #[test]
    fn header_update_without_items_preserves_total() {
        let merged = merge_update(
            base_order(),
            UpdatePurchaseOrderRequest {
                order_number: None,
                supplier_name: Some("New Supplier".to_string()),
                order_date: None,
                due_date: None,
                status: None,
                notes: None,
                items: None,
            },
        );
        assert_eq!(merged.total_amount, dec("35.00"));
        assert_eq!(merged.supplier_name, "New Supplier");
    }

    #[test]
    fn status_overwrite_is_unrestricted() {
        // received back to pending is allowed by design
        let mut order = base_order();
        order.status = "received".to_string();
        let merged = merge_update(
            order,
            UpdatePurchaseOrderRequest {
                order_number: None,
                supplier_name: None,
                order_date: None,
                due_date: None,
                status: Some("pending".to_string()),
                notes: None,
                items: None,
            },
        );
        assert_eq!(merged.status, "pending");
    }
}
