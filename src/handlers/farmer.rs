use axum::{extract::{Path, State}, Extension, Json};
use axum::http::StatusCode;

use crate::audit::AuditEntry;
use crate::dtos::farmer::{CreateFarmerRequest, UpdateFarmerRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::farmer::Farmer;
use crate::state::AppState;

pub async fn create_farmer(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateFarmerRequest>,
) -> Result<(StatusCode, Json<Farmer>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Farmer name is required"));
    }
    let status = req.status.unwrap_or_else(|| "active".to_string());
    if !matches!(status.as_str(), "active" | "inactive") {
        return Err(AppError::validation("Status must be active or inactive"));
    }

    let farmer = sqlx::query_as::<_, Farmer>(
        r#"INSERT INTO farmers (name, phone, email, address, notes, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *"#,
    )
    .bind(req.name.trim())
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.address)
    .bind(&req.notes)
    .bind(&status)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(AuditEntry::by(&auth, "CREATE", "farmers").for_id(farmer.id).with_new(&farmer))
        .await;

    Ok((StatusCode::CREATED, Json(farmer)))
}

pub async fn get_farmer(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Farmer>, AppError> {
    let farmer = fetch_farmer(&db_pool, id).await?;
    Ok(Json(farmer))
}

pub async fn list_farmers(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<Farmer>>, AppError> {
    let farmers = sqlx::query_as::<_, Farmer>(
        "SELECT * FROM farmers ORDER BY created_at DESC",
    )
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(farmers))
}

pub async fn update_farmer(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateFarmerRequest>,
) -> Result<Json<Farmer>, AppError> {
    if let Some(ref status) = req.status {
        if !matches!(status.as_str(), "active" | "inactive") {
            return Err(AppError::validation("Status must be active or inactive"));
        }
    }

    let farmer = fetch_farmer(&db_pool, id).await?;
    let before = farmer.clone();
    let merged = merge_update(farmer, req);

    let updated = sqlx::query_as::<_, Farmer>(
        r#"UPDATE farmers SET
            name = $2, phone = $3, email = $4, address = $5,
            notes = $6, status = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&merged.name)
    .bind(&merged.phone)
    .bind(&merged.email)
    .bind(&merged.address)
    .bind(&merged.notes)
    .bind(&merged.status)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "farmers")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated),
        )
        .await;

    Ok(Json(updated))
}

pub async fn delete_farmer(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let farmer = fetch_farmer(&db_pool, id).await?;

    sqlx::query("DELETE FROM farmers WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "farmers").for_id(id).with_old(&farmer))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_farmer(db_pool: &sqlx::PgPool, id: i64) -> Result<Farmer, AppError> {
    sqlx::query_as::<_, Farmer>("SELECT * FROM farmers WHERE id = $1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Farmer with ID {id} not found")))
}

fn merge_update(mut farmer: Farmer, req: UpdateFarmerRequest) -> Farmer {
    if let Some(name) = req.name {
        farmer.name = name;
    }
    if let Some(phone) = req.phone {
        farmer.phone = phone;
    }
    if let Some(email) = req.email {
        farmer.email = email;
    }
    if let Some(address) = req.address {
        farmer.address = address;
    }
    if let Some(notes) = req.notes {
        farmer.notes = notes;
    }
    if let Some(status) = req.status {
        farmer.status = status;
    }
    farmer
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn base_farmer() -> Farmer {
        Farmer {
            id: 1,
            name: "Kumar Farm".to_string(),
            phone: Some("0771234567".to_string()),
            email: None,
            address: None,
            notes: Some("weekly pickup".to_string()),
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn empty_update() -> UpdateFarmerRequest {
        UpdateFarmerRequest {
            name: None,
            phone: None,
            email: None,
            address: None,
            notes: None,
            status: None,
        }
    }

    #[test]
    fn only_provided_fields_are_applied() {
        let merged = merge_update(
            base_farmer(),
            UpdateFarmerRequest { name: Some("Kumar Poultry Farm".to_string()), ..empty_update() },
        );
        assert_eq!(merged.name, "Kumar Poultry Farm");
        assert_eq!(merged.phone.as_deref(), Some("0771234567"));
        assert_eq!(merged.notes.as_deref(), Some("weekly pickup"));
    }

    #[test]
    fn explicit_null_clears_an_optional_field() {
        let merged = merge_update(
            base_farmer(),
            UpdateFarmerRequest { notes: Some(None), ..empty_update() },
        );
        assert_eq!(merged.notes, None);
        // absent field is untouched
        assert_eq!(merged.phone.as_deref(), Some("0771234567"));
    }
}
