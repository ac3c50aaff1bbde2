//! Inventory items and batches

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Batch, InventoryItem, InventoryItemCreate, InventoryItemUpdate, InventoryQuery, ItemRecord,
    LOW_STOCK_THRESHOLD, StockAdd,
};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::db::product_not_found;
use crate::policy::{self, Action, Resource};
use crate::state::AppState;
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};
use crate::ServiceResult;

pub async fn list_items(
    state: &AppState,
    user: &CurrentUser,
    query: InventoryQuery,
) -> ServiceResult<Vec<InventoryItem>> {
    policy::ensure(user, Action::Read, &Resource::Inventory)?;
    state.store.list_items(&query).await
}

pub async fn get_item(state: &AppState, user: &CurrentUser, sku: &str) -> ServiceResult<InventoryItem> {
    policy::ensure(user, Action::Read, &Resource::Inventory)?;
    state
        .store
        .find_item(&normalize_sku(sku))
        .await?
        .ok_or_else(|| product_not_found(sku).into())
}

/// Items at or below the low-stock threshold, empty ones included
pub async fn low_stock(state: &AppState, user: &CurrentUser) -> ServiceResult<Vec<InventoryItem>> {
    policy::ensure(user, Action::Read, &Resource::Inventory)?;
    let mut items = state.store.low_stock_items(LOW_STOCK_THRESHOLD).await?;
    items.sort_by_key(|i| i.total_stock);
    Ok(items)
}

pub async fn create_item(
    state: &AppState,
    user: &CurrentUser,
    data: InventoryItemCreate,
) -> ServiceResult<InventoryItem> {
    policy::ensure(user, Action::Create, &Resource::Inventory)?;

    let sku = normalize_sku(&data.sku);
    validate_required_text(&sku, "sku", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&data.unit, "unit", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&data.category, "category", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.location, "location", MAX_SHORT_TEXT_LEN)?;

    let now = now_millis();
    let initial = data
        .initial_stock
        .as_ref()
        .map(|stock| new_batch(&sku, stock, now))
        .transpose()?;

    let record = ItemRecord {
        sku,
        name: data.name.trim().to_string(),
        description: data.description,
        unit: data.unit.trim().to_string(),
        category: data.category.trim().to_string(),
        location: data.location,
        created_at: now,
        updated_at: now,
    };
    let item = state.store.insert_item(&record, initial.as_ref()).await?;

    tracing::info!(sku = %item.sku(), stock = item.total_stock, "Inventory item created");
    Ok(item)
}

pub async fn update_item(
    state: &AppState,
    user: &CurrentUser,
    sku: &str,
    data: InventoryItemUpdate,
) -> ServiceResult<InventoryItem> {
    policy::ensure(user, Action::Update, &Resource::Inventory)?;

    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(unit) = &data.unit {
        validate_required_text(unit, "unit", MAX_SHORT_TEXT_LEN)?;
    }
    if let Some(category) = &data.category {
        validate_required_text(category, "category", MAX_SHORT_TEXT_LEN)?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.location, "location", MAX_SHORT_TEXT_LEN)?;

    state
        .store
        .update_item(&normalize_sku(sku), &data, now_millis())
        .await
}

/// Receive stock into the lot `data.lot_code` of `sku`
pub async fn add_stock(
    state: &AppState,
    user: &CurrentUser,
    sku: &str,
    data: StockAdd,
) -> ServiceResult<InventoryItem> {
    policy::ensure(user, Action::Update, &Resource::Inventory)?;

    let sku = normalize_sku(sku);
    let now = now_millis();
    let batch = new_batch(&sku, &data, now)?;
    let item = state.store.add_stock(&sku, &batch, now).await?;

    tracing::info!(
        sku = %sku,
        lot = %batch.lot_code,
        quantity = batch.quantity,
        total = item.total_stock,
        "Stock received"
    );
    Ok(item)
}

pub async fn delete_item(state: &AppState, user: &CurrentUser, sku: &str) -> ServiceResult<()> {
    policy::ensure(user, Action::Delete, &Resource::Inventory)?;
    let sku = normalize_sku(sku);
    state.store.delete_item(&sku).await?;
    tracing::info!(sku = %sku, "Inventory item deleted");
    Ok(())
}

/// SKUs are stored trimmed and upper-case
pub(crate) fn normalize_sku(sku: &str) -> String {
    sku.trim().to_uppercase()
}

fn new_batch(sku: &str, stock: &StockAdd, now: i64) -> Result<Batch, AppError> {
    if stock.quantity <= 0 {
        return Err(AppError::new(ErrorCode::BatchInvalidQuantity)
            .with_detail("quantity", stock.quantity));
    }
    let lot_code = stock.lot_code.trim();
    validate_required_text(lot_code, "lot_code", MAX_SHORT_TEXT_LEN)?;
    Ok(Batch {
        id: snowflake_id(),
        item_sku: sku.to_string(),
        lot_code: lot_code.to_string(),
        quantity: stock.quantity,
        expiry_date: stock.expiry_date,
        received_at: now,
    })
}
