use axum::{extract::State, Extension, Json};
use bcrypt::verify;
use serde::Serialize;

use crate::audit::AuditEntry;
use crate::auth::jwt::{sign_token, TOKEN_LIFETIME_SECONDS};
use crate::dtos::user::{LoginRequest, LoginResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::user::User;
use crate::state::AppState;

pub async fn login(
    State(AppState { db_pool, audit }): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if req.email.trim().is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if req.password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }

    let email = req.email.trim().to_lowercase();

    // Same failure for unknown email and bad password: no user enumeration
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&db_pool)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    let ok = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;
    if !ok {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    if user.status != "active" {
        return Err(AppError::unauthorized("User is inactive"));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::internal("JWT secret not configured"))?;
    let token = sign_token(user.id, &user.email, &user.role, &secret)?;

    sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(&db_pool)
        .await?;

    let mut entry = AuditEntry::system("LOGIN", "auth").describe("User logged in");
    entry.user_id = Some(user.id);
    entry.user_email = Some(user.email.clone());
    audit.record(entry).await;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: TOKEN_LIFETIME_SECONDS,
        user: user.into(),
    }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

pub async fn profile(
    Extension(auth): Extension<AuthContext>,
) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        user_id: auth.user_id,
        email: auth.email,
        role: auth.role,
    })
}
