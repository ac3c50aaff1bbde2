//! Security log API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use shared::models::{
    RegisteredVehicle, SecurityReport, SecurityReportCreate, SecurityReportQuery, VehicleCreate,
};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::security;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/security", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports).post(create_report))
        .route("/reports/{id}/close", post(close))
        .route("/reports/{id}/approve", post(approve))
        .route("/reports/{id}/reject", post(reject))
        .route("/vehicles", get(list_vehicles).post(register_vehicle))
        .route("/vehicles/{plate}", delete(delete_vehicle))
}

/// GET /api/security/reports?kind=&status=
pub async fn list_reports(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SecurityReportQuery>,
) -> ApiResult<Vec<SecurityReport>> {
    Ok(Json(security::list_reports(&state, &user, query).await?))
}

pub async fn create_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<SecurityReportCreate>,
) -> ApiResult<SecurityReport> {
    Ok(Json(security::create_report(&state, &user, payload).await?))
}

/// POST /api/security/reports/{id}/close - incidents only
pub async fn close(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<SecurityReport> {
    Ok(Json(security::close_incident(&state, &user, id).await?))
}

/// POST /api/security/reports/{id}/approve - permits only
pub async fn approve(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<SecurityReport> {
    Ok(Json(security::approve_permit(&state, &user, id).await?))
}

/// POST /api/security/reports/{id}/reject - permits only
pub async fn reject(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<SecurityReport> {
    Ok(Json(security::reject_permit(&state, &user, id).await?))
}

pub async fn list_vehicles(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<RegisteredVehicle>> {
    Ok(Json(security::list_vehicles(&state, &user).await?))
}

pub async fn register_vehicle(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<VehicleCreate>,
) -> ApiResult<RegisteredVehicle> {
    Ok(Json(security::register_vehicle(&state, &user, payload).await?))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(plate): Path<String>,
) -> ApiResult<bool> {
    security::delete_vehicle(&state, &user, &plate).await?;
    Ok(Json(true))
}
