//! Login, registration and session introspection

use axum::{
    Json, Router, middleware,
    extract::State,
    routing::{get, post},
};
use shared::models::{LoginRequest, LoginResponse, ManagedUser, UserRegister};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::services::users;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let login_routes = Router::new()
        .route("/api/auth/login", post(login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let register_routes = Router::new()
        .route("/api/auth/register", post(register))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));

    Router::new()
        .route("/api/auth/me", get(me))
        .merge(login_routes)
        .merge(register_routes)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    Ok(Json(users::login(&state, req).await?))
}

/// POST /api/auth/register - account starts as Pendiente
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<UserRegister>,
) -> ApiResult<ManagedUser> {
    Ok(Json(users::register(&state, req).await?))
}

/// GET /api/auth/me - current account as stored
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<ManagedUser> {
    Ok(Json(users::get_user(&state, &user, user.id).await?))
}
