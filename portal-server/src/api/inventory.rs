//! Inventory API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use shared::models::{
    InventoryItem, InventoryItemCreate, InventoryItemUpdate, InventoryQuery, StockAdd,
};

use super::ApiResult;
use crate::auth::CurrentUser;
use crate::services::inventory;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/low-stock", get(low_stock))
        .route("/{sku}", get(get_by_sku).put(update).delete(delete))
        .route("/{sku}/stock", post(add_stock))
}

/// GET /api/inventory?category=&search=
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<InventoryQuery>,
) -> ApiResult<Vec<InventoryItem>> {
    Ok(Json(inventory::list_items(&state, &user, query).await?))
}

pub async fn low_stock(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<InventoryItem>> {
    Ok(Json(inventory::low_stock(&state, &user).await?))
}

pub async fn get_by_sku(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(sku): Path<String>,
) -> ApiResult<InventoryItem> {
    Ok(Json(inventory::get_item(&state, &user, &sku).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<InventoryItemCreate>,
) -> ApiResult<InventoryItem> {
    Ok(Json(inventory::create_item(&state, &user, payload).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(sku): Path<String>,
    Json(payload): Json<InventoryItemUpdate>,
) -> ApiResult<InventoryItem> {
    Ok(Json(inventory::update_item(&state, &user, &sku, payload).await?))
}

/// POST /api/inventory/{sku}/stock - receive a lot
pub async fn add_stock(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(sku): Path<String>,
    Json(payload): Json<StockAdd>,
) -> ApiResult<InventoryItem> {
    Ok(Json(inventory::add_stock(&state, &user, &sku, payload).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(sku): Path<String>,
) -> ApiResult<bool> {
    inventory::delete_item(&state, &user, &sku).await?;
    Ok(Json(true))
}
