//! Gallery API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};
use serde::Deserialize;
use shared::models::{Area, GalleryPost, GalleryPostCreate};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::gallery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/gallery", get(list).post(create))
        .route("/api/gallery/{id}", delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub area: Option<Area>,
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<GalleryPost>> {
    Ok(Json(gallery::list_posts(&state, &user, query.area).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<GalleryPostCreate>,
) -> ApiResult<GalleryPost> {
    Ok(Json(gallery::create_post(&state, &user, payload).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    gallery::delete_post(&state, &user, id).await?;
    Ok(Json(true))
}
