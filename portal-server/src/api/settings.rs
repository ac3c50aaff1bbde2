//! Company settings API

use axum::{Json, Router, extract::State, routing::get};
use shared::models::{CompanySettings, CompanySettingsUpdate};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::settings;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).put(update))
}

/// GET /api/settings - public
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<CompanySettings> {
    Ok(Json(settings::get(&state).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CompanySettingsUpdate>,
) -> ApiResult<CompanySettings> {
    Ok(Json(settings::update(&state, &user, payload).await?))
}
