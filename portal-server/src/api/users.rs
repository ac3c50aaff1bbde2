//! User administration API (administrators only)

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use shared::models::{ManagedUser, UserCreate, UserUpdate};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::users;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/users",
        Router::new()
            .route("/", get(list).post(create))
            .route("/{id}", put(update).delete(delete))
            .route("/{id}/activate", post(activate)),
    )
}

pub async fn list(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Vec<ManagedUser>> {
    Ok(Json(users::list_users(&state, &user).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<UserCreate>,
) -> ApiResult<ManagedUser> {
    Ok(Json(users::create_user(&state, &user, payload).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> ApiResult<ManagedUser> {
    Ok(Json(users::update_user(&state, &user, id, payload).await?))
}

pub async fn activate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<ManagedUser> {
    Ok(Json(users::activate_user(&state, &user, id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    users::delete_user(&state, &user, id).await?;
    Ok(Json(true))
}
