use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Keyed by a unique business key, not a surrogate id.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}
