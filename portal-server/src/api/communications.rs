//! Communications API

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use shared::models::{Communication, CommunicationCreate};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::communications;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/communications", get(list).post(create))
        .route("/api/communications/{id}", delete(remove))
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<Communication>> {
    Ok(Json(communications::list(&state, &user).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CommunicationCreate>,
) -> ApiResult<Communication> {
    Ok(Json(communications::create(&state, &user, payload).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    communications::delete(&state, &user, id).await?;
    Ok(Json(true))
}
