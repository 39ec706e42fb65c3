use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

use crate::middleware::auth::AuthContext;

/// One audit-trail entry, assembled by a mutating handler before the
/// response is returned.
#[derive(Debug, Default)]
pub struct AuditEntry {
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub action: &'static str,
    pub entity: &'static str,
    pub entity_id: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub description: Option<String>,
}

impl AuditEntry {
    pub fn by(auth: &AuthContext, action: &'static str, entity: &'static str) -> Self {
        Self {
            user_id: Some(auth.user_id),
            user_email: Some(auth.email.clone()),
            action,
            entity,
            ..Self::default()
        }
    }

    /// An entry with no authenticated actor (login attempts).
    pub fn system(action: &'static str, entity: &'static str) -> Self {
        Self { action, entity, ..Self::default() }
    }

    pub fn for_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_old<T: Serialize>(mut self, value: &T) -> Self {
        self.old_values = serde_json::to_value(value).ok();
        self
    }

    pub fn with_new<T: Serialize>(mut self, value: &T) -> Self {
        self.new_values = serde_json::to_value(value).ok();
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Append-only recorder shared by every mutating operation. Appending must
/// never fail the request that triggered it: insert errors are logged and
/// swallowed here.
#[derive(Clone)]
pub struct AuditRecorder {
    pool: PgPool,
}

impl AuditRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: AuditEntry) {
        let result = sqlx::query(
            r#"INSERT INTO audit_logs
                (user_id, user_email, action, entity, entity_id,
                 old_values, new_values, ip_address, user_agent, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(entry.user_id)
        .bind(&entry.user_email)
        .bind(entry.action)
        .bind(entry.entity)
        .bind(&entry.entity_id)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.description)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(
                error = %err,
                action = entry.action,
                entity = entry.entity,
                "failed to append audit log"
            );
        }
    }
}
