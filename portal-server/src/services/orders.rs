//! Purchase order workflow
//!
//! ```text
//! create ──▶ Pendiente ──approve──▶ Aprobado ──dispatch──▶ Despachado
//!                │
//!                └──reject──▶ Rechazado
//! ```
//!
//! Transitions are conditional updates in the store, so two racing approvals
//! (or an approval racing a rejection) cannot both win. Dispatch draws stock
//! in the same transaction as the status change.

use shared::error::{AppError, ErrorCode};
use shared::live::LiveEvent;
use shared::models::{
    Area, NotificationCreate, Order, OrderAction, OrderCreate, OrderItem, OrderQuery, OrderReject,
    OrderStatus, StockStatus,
};
use shared::util::{now_millis, snowflake_id};
use std::collections::BTreeMap;

use crate::auth::CurrentUser;
use crate::db::{insufficient_stock, order_not_found, product_not_found};
use crate::policy::{self, Action, Resource};
use crate::services::inventory::normalize_sku;
use crate::services::notifications::notify_best_effort;
use crate::state::AppState;
use crate::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::ServiceResult;

/// Maximum line items per order
pub const MAX_ORDER_ITEMS: usize = 100;

fn order_link(id: i64) -> String {
    format!("/pedidos/{id}")
}

/// Create a Pendiente order and notify Administración.
///
/// Every SKU must exist and currently hold enough stock for the summed
/// quantity requested. This check is advisory; dispatch re-checks under lock.
pub async fn create_order(
    state: &AppState,
    user: &CurrentUser,
    data: OrderCreate,
) -> ServiceResult<Order> {
    let requesting_area = data.requesting_area.unwrap_or(user.area);
    policy::ensure(user, Action::Create, &Resource::Order { requesting_area })?;

    if data.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).into());
    }
    if data.items.len() > MAX_ORDER_ITEMS {
        return Err(AppError::validation(format!(
            "an order holds at most {MAX_ORDER_ITEMS} items"
        ))
        .into());
    }

    let mut demand: BTreeMap<String, i64> = BTreeMap::new();
    for (index, item) in data.items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(AppError::new(ErrorCode::OrderItemInvalidQuantity)
                .with_detail("position", index + 1)
                .with_detail("quantity", item.quantity)
                .into());
        }
        validate_optional_text(&item.notes, "notes", MAX_NOTE_LEN)?;
        *demand.entry(normalize_sku(&item.product_sku)).or_default() += i64::from(item.quantity);
    }

    let mut catalog = BTreeMap::new();
    for (sku, requested) in &demand {
        let item = state
            .store
            .find_item(sku)
            .await?
            .ok_or_else(|| product_not_found(sku))?;
        if *requested > item.total_stock {
            return Err(insufficient_stock(sku, requested - item.total_stock)
                .with_detail("available", item.total_stock)
                .into());
        }
        catalog.insert(sku.clone(), item);
    }

    let now = now_millis();
    let items = data
        .items
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let sku = normalize_sku(&input.product_sku);
            let (name, unit) = catalog
                .get(&sku)
                .map(|i| (i.record.name.clone(), i.record.unit.clone()))
                .unwrap_or_default();
            OrderItem {
                position: index as i32 + 1,
                product_sku: sku,
                product_name: name,
                quantity: input.quantity,
                unit,
                destination_area: input.destination_area,
                notes: input.notes.clone(),
            }
        })
        .collect::<Vec<_>>();

    let order = Order {
        id: snowflake_id(),
        status: OrderStatus::Pendiente,
        requesting_area,
        requested_by: user.id,
        requested_by_name: user.full_name.clone(),
        rejection_reason: None,
        items,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_order(&order).await?;

    tracing::info!(
        order_id = order.id,
        area = %requesting_area,
        items = order.items.len(),
        "Order created"
    );
    state.live.publish(LiveEvent::OrderChanged(Box::new(order.clone())));

    notify_best_effort(
        state,
        NotificationCreate::new(
            Area::Administracion,
            "Nuevo pedido pendiente",
            format!(
                "{} solicitó {} artículo(s) para {}",
                order.requested_by_name,
                order.items.len(),
                requesting_area
            ),
        )
        .with_link(order_link(order.id)),
    )
    .await;

    Ok(order)
}

/// Orders visible to the caller. Users outside Almacén only see their own area.
pub async fn list_orders(
    state: &AppState,
    user: &CurrentUser,
    mut query: OrderQuery,
) -> ServiceResult<Vec<Order>> {
    if !user.is_admin() && user.area != Area::Almacen {
        query.area = Some(user.area);
    }
    state.store.list_orders(&query).await
}

pub async fn get_order(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<Order> {
    let order = load(state, id).await?;
    policy::ensure(
        user,
        Action::Read,
        &Resource::Order {
            requesting_area: order.requesting_area,
        },
    )?;
    Ok(order)
}

/// Pendiente → Aprobado; notifies Almacén and the requesting area
pub async fn approve_order(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<Order> {
    let order = transition(state, user, id, OrderAction::Approve, None).await?;

    notify_best_effort(
        state,
        NotificationCreate::new(
            Area::Almacen,
            "Pedido aprobado para despacho",
            format!(
                "Pedido de {} con {} artículo(s) listo para despachar",
                order.requesting_area,
                order.items.len()
            ),
        )
        .with_link(order_link(order.id)),
    )
    .await;
    notify_best_effort(
        state,
        NotificationCreate::new(
            order.requesting_area,
            "Pedido aprobado",
            format!("Tu pedido fue aprobado por {}", user.full_name),
        )
        .with_link(order_link(order.id)),
    )
    .await;

    Ok(order)
}

/// Pendiente → Rechazado; notifies the requesting area with the reason
pub async fn reject_order(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
    data: OrderReject,
) -> ServiceResult<Order> {
    validate_optional_text(&data.reason, "reason", MAX_NOTE_LEN)?;
    let reason = data
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let order = transition(state, user, id, OrderAction::Reject, reason.as_deref()).await?;

    let description = match &order.rejection_reason {
        Some(reason) => format!("Tu pedido fue rechazado: {reason}"),
        None => "Tu pedido fue rechazado".to_string(),
    };
    notify_best_effort(
        state,
        NotificationCreate::new(order.requesting_area, "Pedido rechazado", description)
            .with_link(order_link(order.id)),
    )
    .await;

    Ok(order)
}

/// Aprobado → Despachado, consuming batches first-expired-first-out.
///
/// Fails with `InsufficientStock` (and changes nothing) when any SKU cannot
/// cover its line items. Notifies the requesting area, and Almacén for every
/// SKU left low or out of stock.
pub async fn dispatch_order(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<Order> {
    let order = transition(state, user, id, OrderAction::Dispatch, None).await?;

    notify_best_effort(
        state,
        NotificationCreate::new(
            order.requesting_area,
            "Pedido despachado",
            format!("Almacén despachó tu pedido ({} artículo(s))", order.items.len()),
        )
        .with_link(order_link(order.id)),
    )
    .await;

    let mut skus: Vec<&str> = order.items.iter().map(|i| i.product_sku.as_str()).collect();
    skus.sort_unstable();
    skus.dedup();
    for sku in skus {
        match state.store.find_item(sku).await {
            Ok(Some(item)) if item.status != StockStatus::EnStock => {
                notify_best_effort(
                    state,
                    NotificationCreate::new(
                        Area::Almacen,
                        "Stock bajo",
                        format!(
                            "{} ({}) quedó en {} {}: {}",
                            item.record.name,
                            sku,
                            item.total_stock,
                            item.record.unit,
                            item.status.as_str()
                        ),
                    )
                    .with_link(format!("/inventario/{sku}")),
                )
                .await;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(sku, error = %e, "Stock check after dispatch failed"),
        }
    }

    Ok(order)
}

async fn load(state: &AppState, id: i64) -> ServiceResult<Order> {
    state
        .store
        .find_order(id)
        .await?
        .ok_or_else(|| order_not_found(id).into())
}

async fn transition(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
    action: OrderAction,
    reason: Option<&str>,
) -> ServiceResult<Order> {
    let current = load(state, id).await?;
    let policy_action = match action {
        OrderAction::Approve => Action::Approve,
        OrderAction::Reject => Action::Reject,
        OrderAction::Dispatch => Action::Dispatch,
    };
    policy::ensure(
        user,
        policy_action,
        &Resource::Order {
            requesting_area: current.requesting_area,
        },
    )?;

    let order = state
        .store
        .transition_order(id, action, reason, now_millis())
        .await?;

    tracing::info!(
        order_id = id,
        from = %current.status,
        to = %order.status,
        by = user.id,
        "Order status changed"
    );
    state.live.publish(LiveEvent::OrderChanged(Box::new(order.clone())));
    Ok(order)
}
