//! HTTP API
//!
//! Public routes (`/health`, login, registration, settings read) take no
//! session. Everything else extracts a [`CurrentUser`](crate::auth::CurrentUser)
//! from the bearer token; authorization happens in the services.

pub mod auth;
pub mod chat;
pub mod communications;
pub mod fuel;
pub mod gallery;
pub mod health;
pub mod inventory;
pub mod live_ws;
pub mod notifications;
pub mod orders;
pub mod security;
pub mod settings;
pub mod users;

use axum::Json;
use axum::Router;
use http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ServiceError;
use crate::state::AppState;

/// Handler result: JSON payload on success, error envelope otherwise
pub type ApiResult<T> = Result<Json<T>, ServiceError>;

/// Build every route (no tower middleware)
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(orders::router())
        .merge(inventory::router())
        .merge(fuel::router())
        .merge(notifications::router())
        .merge(security::router())
        .merge(users::router())
        .merge(gallery::router())
        .merge(communications::router())
        .merge(chat::router())
        .merge(settings::router())
        .merge(live_ws::router())
}

/// Build the application router with CORS and request tracing
pub fn create_router(state: AppState, cors_origin: Option<&str>) -> Router {
    build_router(&state)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(AllowOrigin::exact(origin)),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid CORS_ALLOWED_ORIGIN: {e}");
            base.allow_origin(Any)
        }
        None => base.allow_origin(Any),
    }
}
