//! Fuel API

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use shared::models::{FuelHistoryEntry, FuelHistoryQuery, FuelLevel, FuelMovementInput};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::fuel;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/fuel",
        Router::new()
            .route("/levels", get(levels))
            .route("/history", get(history))
            .route("/deposit", post(deposit))
            .route("/dispatch", post(dispatch)),
    )
}

pub async fn levels(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Vec<FuelLevel>> {
    Ok(Json(fuel::levels(&state, &user).await?))
}

/// GET /api/fuel/history?fuel_type=&limit=
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<FuelHistoryQuery>,
) -> ApiResult<Vec<FuelHistoryEntry>> {
    Ok(Json(fuel::history(&state, &user, query).await?))
}

pub async fn deposit(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<FuelMovementInput>,
) -> ApiResult<FuelHistoryEntry> {
    Ok(Json(fuel::deposit(&state, &user, payload).await?))
}

pub async fn dispatch(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<FuelMovementInput>,
) -> ApiResult<FuelHistoryEntry> {
    Ok(Json(fuel::dispatch(&state, &user, payload).await?))
}
