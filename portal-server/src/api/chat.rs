//! Chat API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use shared::models::{ChatMessage, ChatMessageCreate, ChatQuery};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::chat;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat/{channel}", get(list).post(post))
}

/// GET /api/chat/{channel}?limit=&before=
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(channel): Path<String>,
    Query(query): Query<ChatQuery>,
) -> ApiResult<Vec<ChatMessage>> {
    Ok(Json(chat::list(&state, &user, &channel, query).await?))
}

pub async fn post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(channel): Path<String>,
    Json(payload): Json<ChatMessageCreate>,
) -> ApiResult<ChatMessage> {
    Ok(Json(chat::post(&state, &user, &channel, payload).await?))
}
