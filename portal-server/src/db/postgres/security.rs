//! Security reports and registered vehicles

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Area, RegisteredVehicle, ReportAction, ReportKind, ReportStatus, SecurityReport,
    SecurityReportQuery,
};

use super::{LIST_LIMIT, PgStore, decode, decode_opt, is_unique_violation};
use crate::db::{SecurityRepository, invalid_report_transition, report_not_found};
use crate::{BoxError, ServiceError, ServiceResult};

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: i64,
    kind: String,
    status: String,
    title: String,
    description: String,
    location: Option<String>,
    vehicle_plate: Option<String>,
    reported_by: i64,
    reported_by_name: String,
    reporter_area: String,
    resolved_by: Option<i64>,
    resolved_at: Option<i64>,
    created_at: i64,
}

impl TryFrom<ReportRow> for SecurityReport {
    type Error = BoxError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(SecurityReport {
            id: row.id,
            kind: decode(&row.kind, "report kind", ReportKind::from_db)?,
            status: decode(&row.status, "report status", ReportStatus::from_db)?,
            title: row.title,
            description: row.description,
            location: row.location,
            vehicle_plate: row.vehicle_plate,
            reported_by: row.reported_by,
            reported_by_name: row.reported_by_name,
            reporter_area: decode(&row.reporter_area, "reporter_area", Area::from_db)?,
            resolved_by: row.resolved_by,
            resolved_at: row.resolved_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    plate: String,
    description: Option<String>,
    owner: Option<String>,
    area: Option<String>,
    created_at: i64,
}

impl TryFrom<VehicleRow> for RegisteredVehicle {
    type Error = BoxError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        Ok(RegisteredVehicle {
            plate: row.plate,
            description: row.description,
            owner: row.owner,
            area: decode_opt(row.area.as_deref(), "vehicle area", Area::from_db)?,
            created_at: row.created_at,
        })
    }
}

const REPORT_COLUMNS: &str = "id, kind, status, title, description, location, vehicle_plate, \
                              reported_by, reported_by_name, reporter_area, resolved_by, \
                              resolved_at, created_at";

async fn insert_vehicle_row<'e, E>(
    executor: E,
    vehicle: &RegisteredVehicle,
    on_conflict_ignore: bool,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let conflict = if on_conflict_ignore {
        "ON CONFLICT (plate) DO NOTHING"
    } else {
        ""
    };
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO registered_vehicles (plate, description, owner, area, created_at)
        VALUES ($1, $2, $3, $4, $5)
        {conflict}
        "#
    ))
    .bind(&vehicle.plate)
    .bind(&vehicle.description)
    .bind(&vehicle.owner)
    .bind(vehicle.area.map(|a| a.as_str()))
    .bind(vehicle.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl SecurityRepository for PgStore {
    async fn insert_report(
        &self,
        report: &SecurityReport,
        vehicle: Option<&RegisteredVehicle>,
    ) -> ServiceResult<()> {
        let mut tx = self.pool().begin().await?;

        if let Some(vehicle) = vehicle {
            let inserted = insert_vehicle_row(&mut *tx, vehicle, true).await?;
            if inserted > 0 {
                tracing::info!(plate = %vehicle.plate, "Vehicle registered from security report");
            }
        }

        sqlx::query(&format!(
            r#"
            INSERT INTO security_reports ({REPORT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#
        ))
        .bind(report.id)
        .bind(report.kind.as_str())
        .bind(report.status.as_str())
        .bind(&report.title)
        .bind(&report.description)
        .bind(&report.location)
        .bind(&report.vehicle_plate)
        .bind(report.reported_by)
        .bind(&report.reported_by_name)
        .bind(report.reporter_area.as_str())
        .bind(report.resolved_by)
        .bind(report.resolved_at)
        .bind(report.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_report(&self, id: i64) -> ServiceResult<Option<SecurityReport>> {
        let row: Option<ReportRow> = sqlx::query_as(&format!(
            "SELECT {REPORT_COLUMNS} FROM security_reports WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(SecurityReport::try_from).transpose()?)
    }

    async fn list_reports(&self, query: &SecurityReportQuery) -> ServiceResult<Vec<SecurityReport>> {
        let rows: Vec<ReportRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REPORT_COLUMNS}
            FROM security_reports
            WHERE ($1::TEXT IS NULL OR kind = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#
        ))
        .bind(query.kind.map(|k| k.as_str()))
        .bind(query.status.map(|s| s.as_str()))
        .bind(LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        let reports = rows
            .into_iter()
            .map(SecurityReport::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    async fn transition_report(
        &self,
        id: i64,
        action: ReportAction,
        resolved_by: i64,
        now: i64,
    ) -> ServiceResult<SecurityReport> {
        let mut tx = self.pool().begin().await?;

        let row: Option<(String, String)> =
            sqlx::query_as("SELECT kind, status FROM security_reports WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (kind, status) = row.ok_or_else(|| report_not_found(id))?;
        let kind = decode(&kind, "report kind", ReportKind::from_db)?;
        let current = decode(&status, "report status", ReportStatus::from_db)?;
        let next = action
            .apply(kind, current)
            .ok_or_else(|| invalid_report_transition(id, current))?;

        sqlx::query(
            r#"
            UPDATE security_reports
            SET status = $1, resolved_by = $2, resolved_at = $3
            WHERE id = $4
            "#,
        )
        .bind(next.as_str())
        .bind(resolved_by)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_report(id)
            .await?
            .ok_or_else(|| report_not_found(id).into())
    }

    async fn list_vehicles(&self) -> ServiceResult<Vec<RegisteredVehicle>> {
        let rows: Vec<VehicleRow> = sqlx::query_as(
            "SELECT plate, description, owner, area, created_at FROM registered_vehicles ORDER BY plate",
        )
        .fetch_all(self.pool())
        .await?;
        let vehicles = rows
            .into_iter()
            .map(RegisteredVehicle::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vehicles)
    }

    async fn find_vehicle(&self, plate: &str) -> ServiceResult<Option<RegisteredVehicle>> {
        let row: Option<VehicleRow> = sqlx::query_as(
            "SELECT plate, description, owner, area, created_at FROM registered_vehicles WHERE plate = $1",
        )
        .bind(plate)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(RegisteredVehicle::try_from).transpose()?)
    }

    async fn insert_vehicle(&self, vehicle: &RegisteredVehicle) -> ServiceResult<()> {
        insert_vehicle_row(self.pool(), vehicle, false)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::new(ErrorCode::VehicleExists)
                        .with_detail("plate", vehicle.plate.as_str())
                        .into()
                } else {
                    ServiceError::from(e)
                }
            })?;
        Ok(())
    }

    async fn delete_vehicle(&self, plate: &str) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM registered_vehicles WHERE plate = $1")
            .bind(plate)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::new(ErrorCode::VehicleNotFound)
                .with_detail("plate", plate)
                .into());
        }
        Ok(())
    }
}
