use axum::{extract::{Path, State}, Extension, Json};
use axum::http::StatusCode;

use crate::audit::AuditEntry;
use crate::dtos::retailer::{CreateRetailerRequest, UpdateRetailerRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::retailer::Retailer;
use crate::state::AppState;

pub async fn create_retailer(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateRetailerRequest>,
) -> Result<(StatusCode, Json<Retailer>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Retailer name is required"));
    }
    let status = req.status.unwrap_or_else(|| "active".to_string());
    if !matches!(status.as_str(), "active" | "inactive") {
        return Err(AppError::validation("Status must be active or inactive"));
    }

    let retailer = sqlx::query_as::<_, Retailer>(
        r#"INSERT INTO retailers (name, owner_name, phone, email, address, notes, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *"#,
    )
    .bind(req.name.trim())
    .bind(&req.owner_name)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.address)
    .bind(&req.notes)
    .bind(&status)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(AuditEntry::by(&auth, "CREATE", "retailers").for_id(retailer.id).with_new(&retailer))
        .await;

    Ok((StatusCode::CREATED, Json(retailer)))
}

pub async fn get_retailer(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Retailer>, AppError> {
    let retailer = fetch_retailer(&db_pool, id).await?;
    Ok(Json(retailer))
}

pub async fn list_retailers(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<Retailer>>, AppError> {
    let retailers = sqlx::query_as::<_, Retailer>(
        "SELECT * FROM retailers ORDER BY created_at DESC",
    )
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(retailers))
}

pub async fn update_retailer(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRetailerRequest>,
) -> Result<Json<Retailer>, AppError> {
    if let Some(ref status) = req.status {
        if !matches!(status.as_str(), "active" | "inactive") {
            return Err(AppError::validation("Status must be active or inactive"));
        }
    }

    let retailer = fetch_retailer(&db_pool, id).await?;
    let before = retailer.clone();
    let merged = merge_update(retailer, req);

    let updated = sqlx::query_as::<_, Retailer>(
        r#"UPDATE retailers SET
            name = $2, owner_name = $3, phone = $4, email = $5,
            address = $6, notes = $7, status = $8, updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&merged.name)
    .bind(&merged.owner_name)
    .bind(&merged.phone)
    .bind(&merged.email)
    .bind(&merged.address)
    .bind(&merged.notes)
    .bind(&merged.status)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "retailers")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated),
        )
        .await;

    Ok(Json(updated))
}

/// Sales referencing this retailer keep their stored id; the reference
/// simply resolves to null from now on.
pub async fn delete_retailer(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let retailer = fetch_retailer(&db_pool, id).await?;

    sqlx::query("DELETE FROM retailers WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "retailers").for_id(id).with_old(&retailer))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_retailer(db_pool: &sqlx::PgPool, id: i64) -> Result<Retailer, AppError> {
    sqlx::query_as::<_, Retailer>("SELECT * FROM retailers WHERE id = $1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Retailer with ID {id} not found")))
}

fn merge_update(mut retailer: Retailer, req: UpdateRetailerRequest) -> Retailer {
    if let Some(name) = req.name {
        retailer.name = name;
    }
    if let Some(owner_name) = req.owner_name {
        retailer.owner_name = owner_name;
    }
    if let Some(phone) = req.phone {
        retailer.phone = phone;
    }
    if let Some(email) = req.email {
        retailer.email = email;
    }
    if let Some(address) = req.address {
        retailer.address = address;
    }
    if let Some(notes) = req.notes {
        retailer.notes = notes;
    }
    if let Some(status) = req.status {
        retailer.status = status;
    }
    retailer
}
