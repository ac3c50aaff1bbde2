//! Order API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use shared::models::{Order, OrderCreate, OrderQuery, OrderReject};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::orders;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id))
        .route("/{id}/approve", post(approve))
        .route("/{id}/reject", post(reject))
        .route("/{id}/dispatch", post(dispatch))
}

/// GET /api/orders?status=&area=
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Vec<Order>> {
    Ok(Json(orders::list_orders(&state, &user, query).await?))
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> ApiResult<Order> {
    Ok(Json(orders::create_order(&state, &user, payload).await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    Ok(Json(orders::get_order(&state, &user, id).await?))
}

/// POST /api/orders/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    Ok(Json(orders::approve_order(&state, &user, id).await?))
}

/// POST /api/orders/{id}/reject - body `{ "reason": ... }` is optional
pub async fn reject(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    payload: Option<Json<OrderReject>>,
) -> ApiResult<Order> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    Ok(Json(orders::reject_order(&state, &user, id, payload).await?))
}

/// POST /api/orders/{id}/dispatch
pub async fn dispatch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    Ok(Json(orders::dispatch_order(&state, &user, id).await?))
}
