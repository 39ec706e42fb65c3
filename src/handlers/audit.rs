use std::collections::BTreeMap;

use axum::{extract::{Path, Query, State}, Json};

use crate::dtos::audit::{
    AuditQuery, AuditStatistics, RecentQuery, StatisticsQuery, UserActivity,
};
use crate::error::AppError;
use crate::models::audit_log::AuditLog;
use crate::state::AppState;

pub async fn list_logs(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let mut sql = String::from("SELECT * FROM audit_logs WHERE 1=1");
    let mut n = 0;

    if q.start_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND created_at::date >= ${n}"));
    }
    if q.end_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND created_at::date <= ${n}"));
    }
    if q.user_id.is_some() {
        n += 1;
        sql.push_str(&format!(" AND user_id = ${n}"));
    }
    if q.action.is_some() {
        n += 1;
        sql.push_str(&format!(" AND action = ${n}"));
    }
    if q.entity.is_some() {
        n += 1;
        sql.push_str(&format!(" AND entity = ${n}"));
    }
    sql.push_str(" ORDER BY created_at DESC");
    if q.limit.is_some() {
        n += 1;
        sql.push_str(&format!(" LIMIT ${n}"));
    }

    let mut query = sqlx::query_as::<_, AuditLog>(&sql);
    if let Some(start) = q.start_date {
        query = query.bind(start);
    }
    if let Some(end) = q.end_date {
        query = query.bind(end);
    }
    if let Some(user_id) = q.user_id {
        query = query.bind(user_id);
    }
    if let Some(ref action) = q.action {
        query = query.bind(action.clone());
    }
    if let Some(ref entity) = q.entity {
        query = query.bind(entity.clone());
    }
    if let Some(limit) = q.limit {
        query = query.bind(limit);
    }

    let logs = query.fetch_all(&db_pool).await?;
    Ok(Json(logs))
}

pub async fn recent_logs(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<RecentQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let logs = sqlx::query_as::<_, AuditLog>(
        "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1",
    )
    .bind(q.limit.unwrap_or(50))
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(logs))
}

pub async fn logs_by_entity(
    State(AppState { db_pool, .. }): State<AppState>,
    Path((entity, entity_id)): Path<(String, String)>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let logs = sqlx::query_as::<_, AuditLog>(
        "SELECT * FROM audit_logs WHERE entity = $1 AND entity_id = $2 ORDER BY created_at DESC",
    )
    .bind(&entity)
    .bind(&entity_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(logs))
}

pub async fn logs_by_user(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(user_id): Path<i64>,
    Query(q): Query<RecentQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let mut sql = String::from("SELECT * FROM audit_logs WHERE user_id = $1 ORDER BY created_at DESC");
    if q.limit.is_some() {
        sql.push_str(" LIMIT $2");
    }

    let mut query = sqlx::query_as::<_, AuditLog>(&sql).bind(user_id);
    if let Some(limit) = q.limit {
        query = query.bind(limit);
    }

    let logs = query.fetch_all(&db_pool).await?;
    Ok(Json(logs))
}

pub async fn statistics(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<StatisticsQuery>,
) -> Result<Json<AuditStatistics>, AppError> {
    let mut sql = String::from("SELECT * FROM audit_logs WHERE 1=1");
    let mut n = 0;

    if q.start_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND created_at::date >= ${n}"));
    }
    if q.end_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND created_at::date <= ${n}"));
    }

    let mut query = sqlx::query_as::<_, AuditLog>(&sql);
    if let Some(start) = q.start_date {
        query = query.bind(start);
    }
    if let Some(end) = q.end_date {
        query = query.bind(end);
    }

    let logs = query.fetch_all(&db_pool).await?;
    Ok(Json(summarize(&logs)))
}

// Computed by scanning the filtered set; no counters are maintained anywhere
fn summarize(logs: &[AuditLog]) -> AuditStatistics {
    let mut by_action: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_entity: BTreeMap<String, u64> = BTreeMap::new();
    let mut users: BTreeMap<i64, (String, u64)> = BTreeMap::new();

    for log in logs {
        *by_action.entry(log.action.clone()).or_default() += 1;
        *by_entity.entry(log.entity.clone()).or_default() += 1;
        if let Some(user_id) = log.user_id {
            let entry = users
                .entry(user_id)
                .or_insert_with(|| (log.user_email.clone().unwrap_or_default(), 0));
            entry.1 += 1;
        }
    }

    let mut by_user: Vec<UserActivity> = users
        .into_iter()
        .map(|(user_id, (user_email, count))| UserActivity { user_id, user_email, count })
        .collect();
    by_user.sort_by(|a, b| b.count.cmp(&a.count).then(a.user_id.cmp(&b.user_id)));

    AuditStatistics {
        total_logs: logs.len(),
        by_action,
        by_entity,
        by_user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn log(user_id: Option<i64>, email: Option<&str>, action: &str, entity: &str) -> AuditLog {
        AuditLog {
            id: 0,
            user_id,
            user_email: email.map(str::to_string),
            action: action.to_string(),
            entity: entity.to_string(),
            entity_id: None,
            old_values: None,
            new_values: None,
            ip_address: None,
            user_agent: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn counts_group_by_action_entity_and_actor() {
        let logs = vec![
            log(Some(1), Some("a@farm.lk"), "CREATE", "sales"),
            log(Some(1), Some("a@farm.lk"), "UPDATE", "sales"),
            log(Some(2), Some("b@farm.lk"), "CREATE", "farmers"),
            log(None, None, "LOGIN", "auth"),
        ];

        let stats = summarize(&logs);

        assert_eq!(stats.total_logs, 4);
        assert_eq!(stats.by_action.get("CREATE"), Some(&2));
        assert_eq!(stats.by_action.get("UPDATE"), Some(&1));
        assert_eq!(stats.by_action.get("LOGIN"), Some(&1));
        assert_eq!(stats.by_entity.get("sales"), Some(&2));
        assert_eq!(stats.by_entity.get("farmers"), Some(&1));
        // anonymous entries count in totals but not per-user
        assert_eq!(stats.by_user.len(), 2);
        assert_eq!(stats.by_user[0].user_id, 1);
        assert_eq!(stats.by_user[0].user_email, "a@farm.lk");
        assert_eq!(stats.by_user[0].count, 2);
    }

    #[test]
    fn empty_set_summarizes_to_zero() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_logs, 0);
        assert!(stats.by_action.is_empty());
        assert!(stats.by_user.is_empty());
    }
}
