use axum::{extract::{Path, State}, Extension, Json};
use axum::http::StatusCode;
use sqlx::PgPool;

use crate::audit::AuditEntry;
use crate::dtos::setting::{
    AppSettings, CreateSettingRequest, MessageResponse, UpdateAppSettingsRequest,
    UpdateSettingRequest, UpsertSettingRequest,
};
use crate::error::{unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::setting::Setting;
use crate::state::AppState;

pub async fn list_settings(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<Setting>>, AppError> {
    let settings = sqlx::query_as::<_, Setting>(
        "SELECT * FROM settings ORDER BY category ASC, key ASC",
    )
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(settings))
}

pub async fn get_setting(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Setting>, AppError> {
    let setting = fetch_setting(&db_pool, &key).await?;
    Ok(Json(setting))
}

pub async fn get_by_category(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Setting>>, AppError> {
    let settings = sqlx::query_as::<_, Setting>(
        "SELECT * FROM settings WHERE category = $1 ORDER BY key ASC",
    )
    .bind(&category)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(settings))
}

pub async fn create_setting(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSettingRequest>,
) -> Result<(StatusCode, Json<Setting>), AppError> {
    if req.key.trim().is_empty() {
        return Err(AppError::validation("Setting key is required"));
    }
    let key = req.key.trim();

    let setting = sqlx::query_as::<_, Setting>(
        r#"INSERT INTO settings (key, value, category, description)
        VALUES ($1, $2, $3, $4)
        RETURNING *"#,
    )
    .bind(key)
    .bind(&req.value)
    .bind(&req.category)
    .bind(&req.description)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| {
        if unique_violation(&e, "settings_pkey") {
            AppError::conflict(format!("Setting with key {key} already exists"))
        } else {
            AppError::db(e)
        }
    })?;

    audit
        .record(AuditEntry::by(&auth, "CREATE", "settings").for_id(&setting.key).with_new(&setting))
        .await;

    Ok((StatusCode::CREATED, Json(setting)))
}

pub async fn update_setting(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
    Json(req): Json<UpdateSettingRequest>,
) -> Result<Json<Setting>, AppError> {
    let setting = fetch_setting(&db_pool, &key).await?;
    let before = setting.clone();

    let mut merged = setting;
    if let Some(value) = req.value {
        merged.value = value;
    }
    if let Some(category) = req.category {
        merged.category = category;
    }
    if let Some(description) = req.description {
        merged.description = description;
    }

    let updated = sqlx::query_as::<_, Setting>(
        r#"UPDATE settings SET
            value = $2, category = $3, description = $4, updated_at = NOW()
        WHERE key = $1
        RETURNING *"#,
    )
    .bind(&key)
    .bind(&merged.value)
    .bind(&merged.category)
    .bind(&merged.description)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "settings")
                .for_id(&key)
                .with_old(&before)
                .with_new(&updated),
        )
        .await;

    Ok(Json(updated))
}

/// Create-if-absent, else update-in-place, keyed by the business key.
pub async fn upsert_setting(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
    Json(req): Json<UpsertSettingRequest>,
) -> Result<Json<Setting>, AppError> {
    if key.trim().is_empty() {
        return Err(AppError::validation("Setting key is required"));
    }

    let setting = upsert(
        &db_pool,
        key.trim(),
        &req.value,
        req.category.as_deref(),
        req.description.as_deref(),
    )
    .await?;

    audit
        .record(AuditEntry::by(&auth, "UPDATE", "settings").for_id(&setting.key).with_new(&setting))
        .await;

    Ok(Json(setting))
}

pub async fn delete_setting(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let setting = fetch_setting(&db_pool, &key).await?;

    sqlx::query("DELETE FROM settings WHERE key = $1")
        .bind(&key)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "settings").for_id(&key).with_old(&setting))
        .await;

    Ok(Json(MessageResponse { message: "Setting deleted successfully" }))
}

pub async fn get_app_settings(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<AppSettings>, AppError> {
    let settings = sqlx::query_as::<_, Setting>("SELECT * FROM settings")
        .fetch_all(&db_pool)
        .await?;

    let lookup = |key: &str, default: &str| -> String {
        settings
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.value.clone())
            .unwrap_or_else(|| default.to_string())
    };

    Ok(Json(AppSettings {
        currency: lookup("currency", "INR"),
        theme: lookup("theme", "light"),
        company_name: lookup("company_name", "Aziz Poultry"),
        company_email: lookup("company_email", ""),
        company_phone: lookup("company_phone", ""),
        company_address: lookup("company_address", ""),
    }))
}

pub async fn update_app_settings(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateAppSettingsRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let fields: [(&str, &Option<String>, &str, &str); 6] = [
        ("currency", &req.currency, "general", "System currency"),
        ("theme", &req.theme, "appearance", "UI theme"),
        ("company_name", &req.company_name, "company", "Company name"),
        ("company_email", &req.company_email, "company", "Company email"),
        ("company_phone", &req.company_phone, "company", "Company phone"),
        ("company_address", &req.company_address, "company", "Company address"),
    ];

    for (key, value, category, description) in fields {
        if let Some(value) = value {
            upsert(&db_pool, key, value, Some(category), Some(description)).await?;
        }
    }

    audit
        .record(AuditEntry::by(&auth, "UPDATE", "settings").describe("App settings updated"))
        .await;

    Ok(Json(MessageResponse { message: "Settings updated successfully" }))
}

async fn fetch_setting(db_pool: &PgPool, key: &str) -> Result<Setting, AppError> {
    sqlx::query_as::<_, Setting>("SELECT * FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Setting with key {key} not found")))
}

// category/description are kept when the upsert does not provide them
async fn upsert(
    db_pool: &PgPool,
    key: &str,
    value: &str,
    category: Option<&str>,
    description: Option<&str>,
) -> Result<Setting, AppError> {
    let setting = sqlx::query_as::<_, Setting>(
        r#"INSERT INTO settings (key, value, category, description)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (key) DO UPDATE SET
            value = EXCLUDED.value,
            category = COALESCE(EXCLUDED.category, settings.category),
            description = COALESCE(EXCLUDED.description, settings.description),
            updated_at = NOW()
        RETURNING *"#,
    )
    .bind(key)
    .bind(value)
    .bind(category)
    .bind(description)
    .fetch_one(db_pool)
    .await?;

    Ok(setting)
}
