//! Fuel levels and ledger

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Area, FuelHistoryEntry, FuelHistoryQuery, FuelLevel, FuelMovement, FuelType, apply_movement,
};

use super::{LIST_LIMIT, PgStore, decode, decode_opt};
use crate::db::{FuelMovementRecord, FuelRepository, fuel_type_not_found, fuel_violation};
use crate::{BoxError, ServiceResult};

#[derive(sqlx::FromRow)]
struct FuelLevelRow {
    fuel_type: String,
    level: Decimal,
    capacity: Decimal,
    updated_at: i64,
}

impl TryFrom<FuelLevelRow> for FuelLevel {
    type Error = BoxError;

    fn try_from(row: FuelLevelRow) -> Result<Self, Self::Error> {
        Ok(FuelLevel {
            fuel_type: decode(&row.fuel_type, "fuel_type", FuelType::from_db)?,
            level: row.level,
            capacity: row.capacity,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FuelHistoryRow {
    id: i64,
    fuel_type: String,
    movement: String,
    quantity: Decimal,
    level_after: Decimal,
    vehicle_plate: Option<String>,
    destination_area: Option<String>,
    operator: Option<String>,
    notes: Option<String>,
    recorded_by: i64,
    created_at: i64,
}

impl TryFrom<FuelHistoryRow> for FuelHistoryEntry {
    type Error = BoxError;

    fn try_from(row: FuelHistoryRow) -> Result<Self, Self::Error> {
        Ok(FuelHistoryEntry {
            id: row.id,
            fuel_type: decode(&row.fuel_type, "fuel_type", FuelType::from_db)?,
            movement: decode(&row.movement, "movement", FuelMovement::from_db)?,
            quantity: row.quantity,
            level_after: row.level_after,
            vehicle_plate: row.vehicle_plate,
            destination_area: decode_opt(
                row.destination_area.as_deref(),
                "destination_area",
                Area::from_db,
            )?,
            operator: row.operator,
            notes: row.notes,
            recorded_by: row.recorded_by,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl FuelRepository for PgStore {
    async fn fuel_levels(&self) -> ServiceResult<Vec<FuelLevel>> {
        let rows: Vec<FuelLevelRow> = sqlx::query_as(
            "SELECT fuel_type, level, capacity, updated_at FROM fuel_levels ORDER BY fuel_type",
        )
        .fetch_all(self.pool())
        .await?;
        let levels = rows
            .into_iter()
            .map(FuelLevel::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(levels)
    }

    async fn fuel_history(&self, query: &FuelHistoryQuery) -> ServiceResult<Vec<FuelHistoryEntry>> {
        let rows: Vec<FuelHistoryRow> = sqlx::query_as(
            r#"
            SELECT id, fuel_type, movement, quantity, level_after, vehicle_plate,
                   destination_area, operator, notes, recorded_by, created_at
            FROM fuel_history
            WHERE ($1::TEXT IS NULL OR fuel_type = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(query.fuel_type.map(|f| f.as_str()))
        .bind(query.limit.unwrap_or(LIST_LIMIT))
        .fetch_all(self.pool())
        .await?;
        let entries = rows
            .into_iter()
            .map(FuelHistoryEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    async fn record_fuel_movement(
        &self,
        record: &FuelMovementRecord,
    ) -> ServiceResult<(FuelHistoryEntry, FuelLevel)> {
        let mut tx = self.pool().begin().await?;

        // Row lock serializes concurrent movements of the same fuel type
        let row: Option<FuelLevelRow> = sqlx::query_as(
            r#"
            SELECT fuel_type, level, capacity, updated_at
            FROM fuel_levels
            WHERE fuel_type = $1
            FOR UPDATE
            "#,
        )
        .bind(record.fuel_type.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let mut level = FuelLevel::try_from(row.ok_or_else(|| fuel_type_not_found(record.fuel_type))?)?;

        let next = apply_movement(&level, record.movement, record.quantity)
            .map_err(|v| fuel_violation(record.fuel_type, v))?;

        sqlx::query("UPDATE fuel_levels SET level = $1, updated_at = $2 WHERE fuel_type = $3")
            .bind(next)
            .bind(record.created_at)
            .bind(record.fuel_type.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO fuel_history (
                id, fuel_type, movement, quantity, level_after, vehicle_plate,
                destination_area, operator, notes, recorded_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.fuel_type.as_str())
        .bind(record.movement.as_str())
        .bind(record.quantity)
        .bind(next)
        .bind(&record.vehicle_plate)
        .bind(record.destination_area.map(|a| a.as_str()))
        .bind(&record.operator)
        .bind(&record.notes)
        .bind(record.recorded_by)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        level.level = next;
        level.updated_at = record.created_at;
        let entry = FuelHistoryEntry {
            id: record.id,
            fuel_type: record.fuel_type,
            movement: record.movement,
            quantity: record.quantity,
            level_after: next,
            vehicle_plate: record.vehicle_plate.clone(),
            destination_area: record.destination_area,
            operator: record.operator.clone(),
            notes: record.notes.clone(),
            recorded_by: record.recorded_by,
            created_at: record.created_at,
        };
        Ok((entry, level))
    }
}
