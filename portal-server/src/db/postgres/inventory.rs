//! Inventory items and batches

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{Batch, InventoryItem, InventoryItemUpdate, InventoryQuery, ItemRecord};
use std::collections::BTreeMap;

use super::{LIST_LIMIT, PgStore, is_unique_violation};
use crate::ServiceResult;
use crate::db::{InventoryRepository, product_not_found};

#[derive(sqlx::FromRow)]
struct ItemRow {
    sku: String,
    name: String,
    description: Option<String>,
    unit: String,
    category: String,
    location: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<ItemRow> for ItemRecord {
    fn from(row: ItemRow) -> Self {
        ItemRecord {
            sku: row.sku,
            name: row.name,
            description: row.description,
            unit: row.unit,
            category: row.category,
            location: row.location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct BatchRow {
    id: i64,
    item_sku: String,
    lot_code: String,
    quantity: i32,
    expiry_date: Option<chrono::NaiveDate>,
    received_at: i64,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Batch {
            id: row.id,
            item_sku: row.item_sku,
            lot_code: row.lot_code,
            quantity: row.quantity,
            expiry_date: row.expiry_date,
            received_at: row.received_at,
        }
    }
}

const ITEM_COLUMNS: &str =
    "sku, name, description, unit, category, location, created_at, updated_at";

async fn insert_batch<'e, E>(executor: E, sku: &str, batch: &Batch) -> ServiceResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO inventory_batches (id, item_sku, lot_code, quantity, expiry_date, received_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (item_sku, lot_code) DO UPDATE SET
            quantity = inventory_batches.quantity + EXCLUDED.quantity,
            expiry_date = COALESCE(inventory_batches.expiry_date, EXCLUDED.expiry_date)
        "#,
    )
    .bind(batch.id)
    .bind(sku)
    .bind(&batch.lot_code)
    .bind(batch.quantity)
    .bind(batch.expiry_date)
    .bind(batch.received_at)
    .execute(executor)
    .await?;
    Ok(())
}

impl PgStore {
    async fn load_items(&self, rows: Vec<ItemRow>) -> ServiceResult<Vec<InventoryItem>> {
        let skus: Vec<String> = rows.iter().map(|r| r.sku.clone()).collect();
        let batch_rows: Vec<BatchRow> = sqlx::query_as(
            r#"
            SELECT id, item_sku, lot_code, quantity, expiry_date, received_at
            FROM inventory_batches
            WHERE item_sku = ANY($1)
            ORDER BY received_at, id
            "#,
        )
        .bind(skus.as_slice())
        .fetch_all(self.pool())
        .await?;

        let mut batches: BTreeMap<String, Vec<Batch>> = BTreeMap::new();
        for row in batch_rows {
            batches.entry(row.item_sku.clone()).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let item_batches = batches.remove(&row.sku).unwrap_or_default();
                InventoryItem::assemble(row.into(), item_batches)
            })
            .collect())
    }

    async fn require_item(&self, sku: &str) -> ServiceResult<InventoryItem> {
        self.find_item(sku)
            .await?
            .ok_or_else(|| product_not_found(sku).into())
    }
}

#[async_trait]
impl InventoryRepository for PgStore {
    async fn list_items(&self, query: &InventoryQuery) -> ServiceResult<Vec<InventoryItem>> {
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s.trim()));
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE ($1::TEXT IS NULL OR lower(category) = lower($1))
              AND ($2::TEXT IS NULL OR sku ILIKE $2 OR name ILIKE $2)
            ORDER BY name, sku
            LIMIT $3
            "#
        ))
        .bind(&query.category)
        .bind(pattern)
        .bind(LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        self.load_items(rows).await
    }

    async fn find_item(&self, sku: &str) -> ServiceResult<Option<InventoryItem>> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE sku = $1"
        ))
        .bind(sku)
        .fetch_optional(self.pool())
        .await?;
        match row {
            Some(row) => Ok(self.load_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn low_stock_items(&self, threshold: i64) -> ServiceResult<Vec<InventoryItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items i
            WHERE (
                SELECT COALESCE(SUM(b.quantity), 0)
                FROM inventory_batches b
                WHERE b.item_sku = i.sku
            ) <= $1
            ORDER BY sku
            "#
        ))
        .bind(threshold)
        .fetch_all(self.pool())
        .await?;
        self.load_items(rows).await
    }

    async fn insert_item(
        &self,
        record: &ItemRecord,
        initial: Option<&Batch>,
    ) -> ServiceResult<InventoryItem> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                sku, name, description, unit, category, location, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&record.sku)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.unit)
        .bind(&record.category)
        .bind(&record.location)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::new(ErrorCode::ProductSkuExists)
                    .with_detail("sku", record.sku.as_str())
                    .into()
            } else {
                crate::ServiceError::from(e)
            }
        })?;

        if let Some(batch) = initial {
            insert_batch(&mut *tx, &record.sku, batch).await?;
        }

        tx.commit().await?;
        self.require_item(&record.sku).await
    }

    async fn update_item(
        &self,
        sku: &str,
        update: &InventoryItemUpdate,
        now: i64,
    ) -> ServiceResult<InventoryItem> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                unit = COALESCE($3, unit),
                category = COALESCE($4, category),
                location = COALESCE($5, location),
                updated_at = $6
            WHERE sku = $7
            "#,
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.unit)
        .bind(&update.category)
        .bind(&update.location)
        .bind(now)
        .bind(sku)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(product_not_found(sku).into());
        }
        self.require_item(sku).await
    }

    async fn add_stock(&self, sku: &str, batch: &Batch, now: i64) -> ServiceResult<InventoryItem> {
        let mut tx = self.pool().begin().await?;

        let locked = sqlx::query("UPDATE inventory_items SET updated_at = $1 WHERE sku = $2")
            .bind(now)
            .bind(sku)
            .execute(&mut *tx)
            .await?;
        if locked.rows_affected() == 0 {
            return Err(product_not_found(sku).into());
        }

        insert_batch(&mut *tx, sku, batch).await?;

        tx.commit().await?;
        self.require_item(sku).await
    }

    async fn delete_item(&self, sku: &str) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE sku = $1")
            .bind(sku)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(product_not_found(sku).into());
        }
        Ok(())
    }
}
