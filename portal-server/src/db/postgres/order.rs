//! Orders and order items

use async_trait::async_trait;
use shared::models::{Area, Batch, Order, OrderAction, OrderItem, OrderQuery, OrderStatus};
use std::collections::BTreeMap;

use super::inventory::BatchRow;
use super::{LIST_LIMIT, PgStore, decode};
use crate::db::{OrderRepository, insufficient_stock, invalid_order_transition, order_not_found};
use crate::{BoxError, ServiceResult};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    status: String,
    requesting_area: String,
    requested_by: i64,
    requested_by_name: String,
    rejection_reason: Option<String>,
    created_at: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i64,
    position: i32,
    product_sku: String,
    product_name: String,
    quantity: i32,
    unit: String,
    destination_area: String,
    notes: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = BoxError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            position: row.position,
            product_sku: row.product_sku,
            product_name: row.product_name,
            quantity: row.quantity,
            unit: row.unit,
            destination_area: decode(&row.destination_area, "destination_area", Area::from_db)?,
            notes: row.notes,
        })
    }
}

fn assemble(row: OrderRow, items: Vec<OrderItem>) -> Result<Order, BoxError> {
    Ok(Order {
        id: row.id,
        status: decode(&row.status, "order status", OrderStatus::from_db)?,
        requesting_area: decode(&row.requesting_area, "requesting_area", Area::from_db)?,
        requested_by: row.requested_by,
        requested_by_name: row.requested_by_name,
        rejection_reason: row.rejection_reason,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

const ORDER_COLUMNS: &str = "id, status, requesting_area, requested_by, requested_by_name, \
                             rejection_reason, created_at, updated_at";

impl PgStore {
    async fn load_orders(&self, rows: Vec<OrderRow>) -> ServiceResult<Vec<Order>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT order_id, position, product_sku, product_name, quantity, unit,
                   destination_area, notes
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(self.pool())
        .await?;

        let mut items: BTreeMap<i64, Vec<OrderItem>> = BTreeMap::new();
        for row in item_rows {
            let order_id = row.order_id;
            items.entry(order_id).or_default().push(row.try_into()?);
        }

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_items = items.remove(&row.id).unwrap_or_default();
            orders.push(assemble(row, order_items)?);
        }
        Ok(orders)
    }

    /// Aprobado → Despachado, drawing each SKU's batches first-expired-first-out.
    ///
    /// The order row and every touched batch row are locked for the duration
    /// of the transaction; SKUs are locked in sorted order.
    async fn dispatch(&self, id: i64, now: i64) -> ServiceResult<Order> {
        let mut tx = self.pool().begin().await?;

        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (status,) = status.ok_or_else(|| order_not_found(id))?;
        let current = decode(&status, "order status", OrderStatus::from_db)?;
        if OrderAction::Dispatch.apply(current).is_none() {
            return Err(invalid_order_transition(id, OrderAction::Dispatch, current).into());
        }

        let lines: Vec<(String, i32)> =
            sqlx::query_as("SELECT product_sku, quantity FROM order_items WHERE order_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        let mut demand: BTreeMap<String, i32> = BTreeMap::new();
        for (sku, quantity) in lines {
            *demand.entry(sku).or_default() += quantity;
        }

        for (sku, quantity) in &demand {
            let batches: Vec<BatchRow> = sqlx::query_as(
                r#"
                SELECT id, item_sku, lot_code, quantity, expiry_date, received_at
                FROM inventory_batches
                WHERE item_sku = $1 AND quantity > 0
                ORDER BY id
                FOR UPDATE
                "#,
            )
            .bind(sku)
            .fetch_all(&mut *tx)
            .await?;
            let batches: Vec<Batch> = batches.into_iter().map(Batch::from).collect();

            let plan = shared::models::plan_consumption(&batches, *quantity)
                .map_err(|shortfall| insufficient_stock(sku, shortfall))?;
            for draw in plan {
                sqlx::query("UPDATE inventory_batches SET quantity = quantity - $1 WHERE id = $2")
                    .bind(draw.take)
                    .bind(draw.batch_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
        )
        .bind(OrderStatus::Despachado.as_str())
        .bind(now)
        .bind(id)
        .bind(OrderStatus::Aprobado.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_order(id)
            .await?
            .ok_or_else(|| order_not_found(id).into())
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn insert_order(&self, order: &Order) -> ServiceResult<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, status, requesting_area, requested_by, requested_by_name,
                rejection_reason, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(order.requesting_area.as_str())
        .bind(order.requested_by)
        .bind(&order.requested_by_name)
        .bind(&order.rejection_reason)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, product_sku, product_name, quantity, unit,
                    destination_area, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(order.id)
            .bind(item.position)
            .bind(&item.product_sku)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(&item.unit)
            .bind(item.destination_area.as_str())
            .bind(&item.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_order(&self, id: i64) -> ServiceResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        match row {
            Some(row) => Ok(self.load_orders(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, query: &OrderQuery) -> ServiceResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR requesting_area = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#
        ))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.area.map(|a| a.as_str()))
        .bind(LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        self.load_orders(rows).await
    }

    async fn transition_order(
        &self,
        id: i64,
        action: OrderAction,
        rejection_reason: Option<&str>,
        now: i64,
    ) -> ServiceResult<Order> {
        if action == OrderAction::Dispatch {
            return self.dispatch(id, now).await;
        }

        let reason = match action {
            OrderAction::Reject => rejection_reason,
            _ => None,
        };
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, rejection_reason = COALESCE($2, rejection_reason), updated_at = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(action.target().as_str())
        .bind(reason)
        .bind(now)
        .bind(id)
        .bind(action.expected_from().as_str())
        .execute(self.pool())
        .await?;

        let order = self.find_order(id).await?.ok_or_else(|| order_not_found(id))?;
        if result.rows_affected() == 0 {
            return Err(invalid_order_transition(id, action, order.status).into());
        }
        Ok(order)
    }
}
