use axum::{extract::{Path, Query, State}, Extension, Json};
use axum::http::StatusCode;
use rust_decimal::Decimal;

use crate::audit::AuditEntry;
use crate::dtos::expense::{
    CategoryTotal, CreateExpenseRequest, ExpenseQuery, TotalExpensesResponse,
    UpdateExpenseRequest,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::expense::{Expense, CATEGORIES, PAYMENT_METHODS};
use crate::state::AppState;

pub async fn create_expense(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    if !CATEGORIES.contains(&req.category.as_str()) {
        return Err(AppError::validation("Invalid expense category"));
    }
    if !PAYMENT_METHODS.contains(&req.payment_method.as_str()) {
        return Err(AppError::validation("Invalid payment method"));
    }
    if req.description.trim().is_empty() {
        return Err(AppError::validation("Description is required"));
    }
    if req.amount < Decimal::ZERO {
        return Err(AppError::validation("Amount cannot be negative"));
    }

    let expense = sqlx::query_as::<_, Expense>(
        r#"INSERT INTO expenses (expense_date, category, description, amount, payment_method, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *"#,
    )
    .bind(req.expense_date)
    .bind(&req.category)
    .bind(&req.description)
    .bind(req.amount)
    .bind(&req.payment_method)
    .bind(&req.notes)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(AuditEntry::by(&auth, "CREATE", "expenses").for_id(expense.id).with_new(&expense))
        .await;

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get_expense(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    let expense = fetch_expense(&db_pool, id).await?;
    Ok(Json(expense))
}

pub async fn list_expenses(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let mut sql = String::from("SELECT * FROM expenses WHERE 1=1");
    let mut n = 0;

    if q.start_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND expense_date >= ${n}"));
    }
    if q.end_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND expense_date <= ${n}"));
    }
    if q.category.is_some() {
        n += 1;
        sql.push_str(&format!(" AND category = ${n}"));
    }
    if q.payment_method.is_some() {
        n += 1;
        sql.push_str(&format!(" AND payment_method = ${n}"));
    }
    sql.push_str(" ORDER BY expense_date DESC, id DESC");

    let mut query = sqlx::query_as::<_, Expense>(&sql);
    if let Some(start) = q.start_date {
        query = query.bind(start);
    }
    if let Some(end) = q.end_date {
        query = query.bind(end);
    }
    if let Some(ref category) = q.category {
        query = query.bind(category.clone());
    }
    if let Some(ref payment_method) = q.payment_method {
        query = query.bind(payment_method.clone());
    }

    let expenses = query.fetch_all(&db_pool).await?;
    Ok(Json(expenses))
}

pub async fn update_expense(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    if let Some(ref category) = req.category {
        if !CATEGORIES.contains(&category.as_str()) {
            return Err(AppError::validation("Invalid expense category"));
        }
    }
    if let Some(ref payment_method) = req.payment_method {
        if !PAYMENT_METHODS.contains(&payment_method.as_str()) {
            return Err(AppError::validation("Invalid payment method"));
        }
    }
    if matches!(req.amount, Some(a) if a < Decimal::ZERO) {
        return Err(AppError::validation("Amount cannot be negative"));
    }

    let expense = fetch_expense(&db_pool, id).await?;
    let before = expense.clone();
    let merged = merge_update(expense, req);

    let updated = sqlx::query_as::<_, Expense>(
        r#"UPDATE expenses SET
            expense_date = $2, category = $3, description = $4,
            amount = $5, payment_method = $6, notes = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(merged.expense_date)
    .bind(&merged.category)
    .bind(&merged.description)
    .bind(merged.amount)
    .bind(&merged.payment_method)
    .bind(&merged.notes)
    .fetch_one(&db_pool)
    .await?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "expenses")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated),
        )
        .await;

    Ok(Json(updated))
}

pub async fn delete_expense(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let expense = fetch_expense(&db_pool, id).await?;

    sqlx::query("DELETE FROM expenses WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "expenses").for_id(id).with_old(&expense))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn expenses_by_category(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<ExpenseQuery>,
) -> Result<Json<Vec<CategoryTotal>>, AppError> {
    let mut sql = String::from(
        "SELECT category, COALESCE(SUM(amount), 0) AS total FROM expenses WHERE 1=1",
    );
    let mut n = 0;

    if q.start_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND expense_date >= ${n}"));
    }
    if q.end_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND expense_date <= ${n}"));
    }
    sql.push_str(" GROUP BY category ORDER BY category ASC");

    let mut query = sqlx::query_as::<_, CategoryTotal>(&sql);
    if let Some(start) = q.start_date {
        query = query.bind(start);
    }
    if let Some(end) = q.end_date {
        query = query.bind(end);
    }

    let rows = query.fetch_all(&db_pool).await?;
    Ok(Json(rows))
}

pub async fn total_expenses(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(q): Query<ExpenseQuery>,
) -> Result<Json<TotalExpensesResponse>, AppError> {
    let mut sql = String::from("SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE 1=1");
    let mut n = 0;

    if q.start_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND expense_date >= ${n}"));
    }
    if q.end_date.is_some() {
        n += 1;
        sql.push_str(&format!(" AND expense_date <= ${n}"));
    }

    let mut query = sqlx::query_scalar::<_, Decimal>(&sql);
    if let Some(start) = q.start_date {
        query = query.bind(start);
    }
    if let Some(end) = q.end_date {
        query = query.bind(end);
    }

    let total = query.fetch_one(&db_pool).await?;
    Ok(Json(TotalExpensesResponse { total }))
}

async fn fetch_expense(db_pool: &sqlx::PgPool, id: i64) -> Result<Expense, AppError> {
    sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = $1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Expense with ID {id} not found")))
}

fn merge_update(mut expense: Expense, req: UpdateExpenseRequest) -> Expense {
    if let Some(expense_date) = req.expense_date {
        expense.expense_date = expense_date;
    }
    if let Some(category) = req.category {
        expense.category = category;
    }
    if let Some(description) = req.description {
        expense.description = description;
    }
    if let Some(amount) = req.amount {
        expense.amount = amount;
    }
    if let Some(payment_method) = req.payment_method {
        expense.payment_method = payment_method;
    }
    if let Some(notes) = req.notes {
        expense.notes = notes;
    }
    expense
}
