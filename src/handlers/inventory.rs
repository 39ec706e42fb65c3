use axum::{extract::{Path, Query, State}, Extension, Json};
use axum::http::StatusCode;
use rust_decimal::Decimal;

use crate::audit::AuditEntry;
use crate::dtos::inventory::{
    CreateInventoryItemRequest, InventoryQuery, TotalValueResponse, TypeBreakdown,
    UpdateInventoryItemRequest,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::inventory::InventoryItem;
use crate::state::AppState;

pub async fn create_item(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateInventoryItemRequest>,
) -> Result<(StatusCode, Json<InventoryItem>), AppError> {
    if req.item_name.trim().is_empty() {
        return Err(AppError::validation("Item name is required"));
    }
    if req.item_type.trim().is_empty() {
        return Err(AppError::validation("Item type is required"));
    }

    let item = sqlx::query_as::<_, InventoryItem>(
        r#"INSERT INTO inventory_items
            (item_type, item_name, quantity, unit, minimum_stock_level,
             current_stock_level, notes, last_updated)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING *"#,
    )
    .bind(req.item_type.trim())
    .bind(req.item_name.trim())
    .bind(req.quantity.unwrap_or(Decimal::ZERO))
    .bind(&req.unit)
    .bind(req.minimum_stock_level.unwrap_or(Decimal::ZERO))
    .bind(req.current_stock_level.unwrap_or(Decimal::ZERO))
    .bind(&req.notes)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(AuditEntry::by(&auth, "CREATE", "inventory_items").for_id(item.id).with_new(&item))
        .await;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InventoryItem>, AppError> {
    let item = fetch_item(&db_pool, id).await?;
    Ok(Json(item))
}

pub async fn list_items(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<InventoryQuery>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    let mut sql = String::from("SELECT * FROM inventory_items WHERE 1=1");
    let mut n = 0;

    if q.start_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND last_updated::date >= ${n}"));
    }
    if q.end_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND last_updated::date <= ${n}"));
    }
    sql.push_str(" ORDER BY item_name ASC");

    let mut query = sqlx::query_as::<_, InventoryItem>(&sql);
    if let Some(start) = q.start_date {
        query = query.bind(start);
    }
    if let Some(end) = q.end_date {
        query = query.bind(end);
    }

    let items = query.fetch_all(&db_pool).await?;
    Ok(Json(items))
}

pub async fn update_item(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateInventoryItemRequest>,
) -> Result<Json<InventoryItem>, AppError> {
    let item = fetch_item(&db_pool, id).await?;
    let before = item.clone();
    let merged = merge_update(item, req);

    // every mutation refreshes last_updated alongside updated_at
    let updated = sqlx::query_as::<_, InventoryItem>(
        r#"UPDATE inventory_items SET
            item_type = $2, item_name = $3, quantity = $4, unit = $5,
            minimum_stock_level = $6, current_stock_level = $7, notes = $8,
            updated_at = NOW(), last_updated = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&merged.item_type)
    .bind(&merged.item_name)
    .bind(merged.quantity)
    .bind(&merged.unit)
    .bind(merged.minimum_stock_level)
    .bind(merged.current_stock_level)
    .bind(&merged.notes)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "inventory_items")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated),
        )
        .await;

    Ok(Json(updated))
}

pub async fn delete_item(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let item = fetch_item(&db_pool, id).await?;

    sqlx::query("DELETE FROM inventory_items WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "inventory_items").for_id(id).with_old(&item))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Boundary inclusive: an item sitting exactly at its minimum is low.
pub async fn low_stock(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    let items = sqlx::query_as::<_, InventoryItem>(
        r#"SELECT * FROM inventory_items
        WHERE current_stock_level <= minimum_stock_level
        ORDER BY item_name ASC"#,
    )
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(items))
}

/// Sums stock quantities, not quantity times price: inventory items carry no
/// unit cost, so "value" is a quantity aggregate here.
pub async fn total_value(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<TotalValueResponse>, AppError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(current_stock_level), 0) FROM inventory_items",
    )
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(TotalValueResponse { total }))
}

pub async fn by_type(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<TypeBreakdown>>, AppError> {
    let rows = sqlx::query_as::<_, TypeBreakdown>(
        r#"SELECT item_type,
            COUNT(*) AS count,
            COALESCE(SUM(current_stock_level), 0) AS total_quantity
        FROM inventory_items
        GROUP BY item_type
        ORDER BY item_type ASC"#,
    )
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(rows))
}

async fn fetch_item(db_pool: &sqlx::PgPool, id: i64) -> Result<InventoryItem, AppError> {
    sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Inventory item with ID {id} not found")))
}

fn merge_update(mut item: InventoryItem, req: UpdateInventoryItemRequest) -> InventoryItem {
    if let Some(item_type) = req.item_type {
        item.item_type = item_type;
    }
    if let Some(item_name) = req.item_name {
        item.item_name = item_name;
    }
    if let Some(quantity) = req.quantity {
        item.quantity = quantity;
    }
    if let Some(unit) = req.unit {
        item.unit = unit;
    }
    if let Some(minimum_stock_level) = req.minimum_stock_level {
        item.minimum_stock_level = minimum_stock_level;
    }
    if let Some(current_stock_level) = req.current_stock_level {
        item.current_stock_level = current_stock_level;
    }
    if let Some(notes) = req.notes {
        item.notes = notes;
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn base_item() -> InventoryItem {
        InventoryItem {
            id: 1,
            item_type: "feed".to_string(),
            item_name: "Layer mash".to_string(),
            quantity: dec("40"),
            unit: "kg".to_string(),
            minimum_stock_level: dec("10"),
            current_stock_level: dec("25"),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn stock_level_update_leaves_other_fields_alone() {
        let merged = merge_update(
            base_item(),
            UpdateInventoryItemRequest {
                item_type: None,
                item_name: None,
                quantity: None,
                unit: None,
                minimum_stock_level: None,
                current_stock_level: Some(dec("8")),
                notes: None,
            },
        );
        assert_eq!(merged.current_stock_level, dec("8"));
        assert_eq!(merged.minimum_stock_level, dec("10"));
        assert!(merged.is_low_stock());
    }
}
