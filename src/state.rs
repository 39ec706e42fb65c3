use sqlx::PgPool;

use crate::audit::AuditRecorder;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub audit: AuditRecorder,
}

impl AppState {
    pub fn new(db_pool: PgPool) -> Self {
        let audit = AuditRecorder::new(db_pool.clone());
        Self { db_pool, audit }
    }
}
