use axum::{extract::{Path, State}, Extension, Json};
use axum::http::StatusCode;

use crate::audit::AuditEntry;
use crate::dtos::vehicle::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::error::{unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;

pub async fn create_vehicle(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    if req.vehicle_number.trim().is_empty() {
        return Err(AppError::validation("Vehicle number is required"));
    }
    let status = req.status.unwrap_or_else(|| "active".to_string());
    if !matches!(status.as_str(), "active" | "inactive") {
        return Err(AppError::validation("Status must be active or inactive"));
    }

    let vehicle_number = req.vehicle_number.trim();
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM vehicles WHERE vehicle_number = $1)",
    )
    .bind(vehicle_number)
    .fetch_one(&db_pool)
    .await?;
    if exists {
        return Err(AppError::conflict(format!(
            "Vehicle with number {vehicle_number} already exists"
        )));
    }

    let vehicle = sqlx::query_as::<_, Vehicle>(
        r#"INSERT INTO vehicles
            (vehicle_number, vehicle_type, driver_name, phone, owner_name, address,
             total_capacity, petrol_tank_capacity, mileage, join_date, status, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *"#,
    )
    .bind(vehicle_number)
    .bind(&req.vehicle_type)
    .bind(&req.driver_name)
    .bind(&req.phone)
    .bind(&req.owner_name)
    .bind(&req.address)
    .bind(req.total_capacity)
    .bind(req.petrol_tank_capacity)
    .bind(req.mileage)
    .bind(req.join_date)
    .bind(&status)
    .bind(&req.note)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| {
        if unique_violation(&e, "vehicles_vehicle_number_key") {
            AppError::conflict(format!("Vehicle with number {vehicle_number} already exists"))
        } else {
            AppError::db(e)
        }
    })?;

    audit
        .record(AuditEntry::by(&auth, "CREATE", "vehicles").for_id(vehicle.id).with_new(&vehicle))
        .await;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn get_vehicle(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vehicle>, AppError> {
    let vehicle = fetch_vehicle(&db_pool, id).await?;
    Ok(Json(vehicle))
}

pub async fn list_vehicles(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let vehicles = sqlx::query_as::<_, Vehicle>(
        "SELECT * FROM vehicles ORDER BY driver_name ASC",
    )
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(vehicles))
}

pub async fn update_vehicle(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateVehicleRequest>,
) -> Result<Json<Vehicle>, AppError> {
    if let Some(ref status) = req.status {
        if !matches!(status.as_str(), "active" | "inactive") {
            return Err(AppError::validation("Status must be active or inactive"));
        }
    }

    let vehicle = fetch_vehicle(&db_pool, id).await?;

    // Renaming re-checks uniqueness excluding this row
    if let Some(ref new_number) = req.vehicle_number {
        let new_number = new_number.trim();
        if new_number.is_empty() {
            return Err(AppError::validation("Vehicle number is required"));
        }
        if new_number != vehicle.vehicle_number {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM vehicles WHERE vehicle_number = $1 AND id <> $2)",
            )
            .bind(new_number)
            .bind(id)
            .fetch_one(&db_pool)
            .await?;
            if taken {
                return Err(AppError::conflict(format!(
                    "Vehicle with number {new_number} already exists"
                )));
            }
        }
    }

    let before = vehicle.clone();
    let merged = merge_update(vehicle, req);

    let updated = sqlx::query_as::<_, Vehicle>(
        r#"UPDATE vehicles SET
            vehicle_number = $2, vehicle_type = $3, driver_name = $4, phone = $5,
            owner_name = $6, address = $7, total_capacity = $8,
            petrol_tank_capacity = $9, mileage = $10, join_date = $11,
            status = $12, note = $13, updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(merged.vehicle_number.trim())
    .bind(&merged.vehicle_type)
    .bind(&merged.driver_name)
    .bind(&merged.phone)
    .bind(&merged.owner_name)
    .bind(&merged.address)
    .bind(merged.total_capacity)
    .bind(merged.petrol_tank_capacity)
    .bind(merged.mileage)
    .bind(merged.join_date)
    .bind(&merged.status)
    .bind(&merged.note)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| {
        if unique_violation(&e, "vehicles_vehicle_number_key") {
            AppError::conflict("Vehicle number already exists")
        } else {
            AppError::db(e)
        }
    })?;

    audit
        .record(
            AuditEntry::by(&auth, "UPDATE", "vehicles")
                .for_id(id)
                .with_old(&before)
                .with_new(&updated),
        )
        .await;

    Ok(Json(updated))
}

pub async fn delete_vehicle(
    State(AppState { db_pool, audit }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let vehicle = fetch_vehicle(&db_pool, id).await?;

    sqlx::query("DELETE FROM vehicles WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    audit
        .record(AuditEntry::by(&auth, "DELETE", "vehicles").for_id(id).with_old(&vehicle))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_vehicle(db_pool: &sqlx::PgPool, id: i64) -> Result<Vehicle, AppError> {
    sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Vehicle with ID {id} not found")))
}

fn merge_update(mut vehicle: Vehicle, req: UpdateVehicleRequest) -> Vehicle {
    if let Some(vehicle_number) = req.vehicle_number {
        vehicle.vehicle_number = vehicle_number;
    }
    if let Some(vehicle_type) = req.vehicle_type {
        vehicle.vehicle_type = vehicle_type;
    }
    if let Some(driver_name) = req.driver_name {
        vehicle.driver_name = driver_name;
    }
    if let Some(phone) = req.phone {
        vehicle.phone = phone;
    }
    if let Some(owner_name) = req.owner_name {
        vehicle.owner_name = owner_name;
    }
    if let Some(address) = req.address {
        vehicle.address = address;
    }
    if let Some(total_capacity) = req.total_capacity {
        vehicle.total_capacity = total_capacity;
    }
    if let Some(petrol_tank_capacity) = req.petrol_tank_capacity {
        vehicle.petrol_tank_capacity = petrol_tank_capacity;
    }
    if let Some(mileage) = req.mileage {
        vehicle.mileage = mileage;
    }
    if let Some(join_date) = req.join_date {
        vehicle.join_date = join_date;
    }
    if let Some(status) = req.status {
        vehicle.status = status;
    }
    if let Some(note) = req.note {
        vehicle.note = note;
    }
    vehicle
}
