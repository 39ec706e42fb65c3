use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AuditQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub entity: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct StatisticsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UserActivity {
    pub user_id: i64,
    pub user_email: String,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AuditStatistics {
    pub total_logs: usize,
    pub by_action: BTreeMap<String, u64>,
    pub by_entity: BTreeMap<String, u64>,
    pub by_user: Vec<UserActivity>,
}
