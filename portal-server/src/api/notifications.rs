//! Notification API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use shared::models::{Area, Notification};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::notifications;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/notifications",
        Router::new()
            .route("/", get(list))
            .route("/read-all", post(mark_all_read))
            .route("/{id}/read", post(mark_read)),
    )
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Administrators only; ignored for everyone else
    pub area: Option<Area>,
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

/// GET /api/notifications?unread_only=true
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Notification>> {
    let rows =
        notifications::list_for(&state, &user, query.area, query.unread_only, query.limit).await?;
    Ok(Json(rows))
}

pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Notification> {
    Ok(Json(notifications::mark_read(&state, &user, id).await?))
}

/// POST /api/notifications/read-all - returns how many rows changed
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<serde_json::Value> {
    let updated = notifications::mark_all_read(&state, &user).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
