use axum::{extract::{Path, State}, Extension, Json};
use axum::http::StatusCode;
use bcrypt::{hash, DEFAULT_COST};

use crate::audit::AuditEntry;
use crate::dtos::user::{CreateUserRequest, UpdateUserRequest, UserResponse, UserStatistics};
use crate::error::{unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::user::User;
use crate::state::AppState;

// User management is admin-only
fn require_admin(auth: &AuthContext) -> Result<(), AppError> {
    if auth.role != "admin" {
        return Err(AppError::forbidden("Only admins can manage users"));
    }
    Ok(())
}

pub async fn create_user(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    require_admin(&auth)?;

    if req.name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if req.email.trim().is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if req.password.len() < 6 {
        return Err(AppError::validation("Password too short"));
    }
    let role = req.role.unwrap_or_else(|| "manager".to_string());
    if !matches!(role.as_str(), "admin" | "manager" | "staff") {
        return Err(AppError::validation("Invalid role"));
    }
    let status = req.status.unwrap_or_else(|| "active".to_string());
    if !matches!(status.as_str(), "active" | "inactive") {
        return Err(AppError::validation("Status must be active or inactive"));
    }

    // uniqueness is case-insensitive: emails are stored lowercase
    let email = req.email.trim().to_lowercase();

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    let user = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (name, email, password_hash, role, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *"#,
    )
    .bind(req.name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(&role)
    .bind(&status)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| {
        if unique_violation(&e, "users_email_key") {
            AppError::conflict(format!("User with email {email} already exists"))
        } else {
            AppError::db(e)
        }
    })?;

    audit
        .record(AuditEntry::by(&auth, "CREATE", "users").for_id(user.id).with_new(&user))
        .await;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    require_admin(&auth)?;
    let user = fetch_user(&db_pool, id).await?;
    Ok(Json(user.into()))
}

pub async fn list_users(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    require_admin(&auth)?;
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name ASC")
        .fetch_all(&db_pool)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn update_user(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    require_admin(&auth)?;

    if let Some(ref role) = req.role {
        if !matches!(role.as_str(), "admin" | "manager" | "staff") {
            return Err(AppError::validation("Invalid role"));
        }
    }
    if let Some(ref status) = req.status {
        if !matches!(status.as_str(), "active" | "inactive") {
            return Err(AppError::validation("Status must be active or inactive"));
        }
    }
    if let Some(ref password) = req.password {
        if password.len() < 6 {
            return Err(AppError::validation("Password too short"));
        }
    }

    let user = fetch_user(&db_pool, id).await?;

    let email = req.email.as_ref().map(|e| e.trim().to_lowercase());
    if let Some(ref new_email) = email {
        if *new_email != user.email {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
            )
            .bind(new_email)
            .bind(id)
            .fetch_one(&db_pool)
            .await?;
            if taken {
                return Err(AppError::conflict(format!(
                    "User with email {new_email} already exists"
                )));
            }
        }
    }

    let password_hash = match req.password {
        Some(ref password) => Some(
            hash(password, DEFAULT_COST)
                .map_err(|e| AppError::internal(format!("Hash error: {e}")))?,
        ),
        None => None,
    };

    let before = user.clone();
    let mut merged = user;
    if let Some(name) = req.name {
        merged.name = name;
    }
    if let Some(email) = email {
        merged.email = email;
    }
    if let Some(password_hash) = password_hash {
        merged.password_hash = password_hash;
    }
    if let Some(role) = req.role {
        merged.role = role;
    }
    if let Some(status) = req.status {
        merged.status = status;
    }

    let updated = sqlx::query_as::<_, User>(
        r#"UPDATE users SET
            name = $2, email = $3, password_hash = $4, role = $5,
            status = $6, updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&merged.name)
    .bind(&merged.email)
    .bind(&merged.password_hash)
    .bind(&merged.role)
    .bind(&merged.status)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| {
        if unique_violation(&e, "users_email_key") {
            AppError::conflict("Email already exists")
        } else {
            AppError::db(e)
        }
    })?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "users")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated),
        )
        .await;

    Ok(Json(updated.into()))
}

pub async fn activate_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    set_user_status(state, auth, id, "active").await
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    set_user_status(state, auth, id, "inactive").await
}

async fn set_user_status(
    AppState { db_pool, audit }: AppState,
    auth: AuthContext,
    id: i64,
    status: &'static str,
) -> Result<Json<UserResponse>, AppError> {
    require_admin(&auth)?;
    let before = fetch_user(&db_pool, id).await?;

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "users")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated)
                .describe(format!("Account set to {status}")),
        )
        .await;

    Ok(Json(updated.into()))
}

pub async fn delete_user(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&auth)?;
    let user = fetch_user(&db_pool, id).await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "users").for_id(id).with_old(&user))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_statistics(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserStatistics>, AppError> {
    require_admin(&auth)?;

    let row = sqlx::query_as::<_, StatsRow>(
        r#"SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'active') AS active,
            COUNT(*) FILTER (WHERE status = 'inactive') AS inactive,
            COUNT(*) FILTER (WHERE role = 'admin') AS admins,
            COUNT(*) FILTER (WHERE role = 'manager') AS managers,
            COUNT(*) FILTER (WHERE role = 'staff') AS staff
        FROM users"#,
    )
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(UserStatistics {
        total_users: row.total,
        active_users: row.active,
        inactive_users: row.inactive,
        admin_users: row.admins,
        manager_users: row.managers,
        staff_users: row.staff,
    }))
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    active: i64,
    inactive: i64,
    admins: i64,
    managers: i64,
    staff: i64,
}

async fn fetch_user(db_pool: &sqlx::PgPool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User with ID {id} not found")))
}
