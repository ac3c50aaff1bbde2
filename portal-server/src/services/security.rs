//! Security log: incident reports, entry permits and registered vehicles

use shared::live::LiveEvent;
use shared::models::{
    Area, NotificationCreate, RegisteredVehicle, ReportAction, ReportKind, SecurityReport,
    SecurityReportCreate, SecurityReportQuery, VehicleCreate, normalize_plate,
};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::db::report_not_found;
use crate::policy::{self, Action, Resource};
use crate::services::notifications::notify_best_effort;
use crate::state::AppState;
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};
use crate::ServiceResult;

const REPORTS_LINK: &str = "/seguridad";

pub async fn list_reports(
    state: &AppState,
    user: &CurrentUser,
    query: SecurityReportQuery,
) -> ServiceResult<Vec<SecurityReport>> {
    // kind is irrelevant for reads
    policy::ensure(
        user,
        Action::Read,
        &Resource::SecurityReport {
            kind: ReportKind::Incidente,
        },
    )?;
    state.store.list_reports(&query).await
}

/// File an incident (Abierto) or an entry permit (Pendiente).
///
/// A plate not yet on the vehicle register is added in the same write.
pub async fn create_report(
    state: &AppState,
    user: &CurrentUser,
    data: SecurityReportCreate,
) -> ServiceResult<SecurityReport> {
    policy::ensure(user, Action::Create, &Resource::SecurityReport { kind: data.kind })?;

    validate_required_text(&data.title, "title", MAX_NAME_LEN)?;
    validate_required_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.location, "location", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.vehicle_plate, "vehicle_plate", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.vehicle_description, "vehicle_description", MAX_NOTE_LEN)?;

    let now = now_millis();
    let plate = data
        .vehicle_plate
        .as_deref()
        .map(normalize_plate)
        .filter(|p| !p.is_empty());

    let new_vehicle = match &plate {
        Some(plate) if state.store.find_vehicle(plate).await?.is_none() => {
            Some(RegisteredVehicle {
                plate: plate.clone(),
                description: data.vehicle_description.clone(),
                owner: None,
                area: Some(user.area),
                created_at: now,
            })
        }
        _ => None,
    };

    let report = SecurityReport {
        id: snowflake_id(),
        kind: data.kind,
        status: data.kind.initial_status(),
        title: data.title.trim().to_string(),
        description: data.description,
        location: data.location,
        vehicle_plate: plate,
        reported_by: user.id,
        reported_by_name: user.full_name.clone(),
        reporter_area: user.area,
        resolved_by: None,
        resolved_at: None,
        created_at: now,
    };
    state
        .store
        .insert_report(&report, new_vehicle.as_ref())
        .await?;

    tracing::info!(
        report_id = report.id,
        kind = report.kind.as_str(),
        vehicle_registered = new_vehicle.is_some(),
        "Security report filed"
    );
    state
        .live
        .publish(LiveEvent::ReportChanged(Box::new(report.clone())));

    if report.kind == ReportKind::Permiso {
        notify_best_effort(
            state,
            NotificationCreate::new(
                Area::Seguridad,
                "Nuevo permiso pendiente",
                format!("{} ({}): {}", report.reported_by_name, report.reporter_area, report.title),
            )
            .with_link(REPORTS_LINK),
        )
        .await;
    }
    Ok(report)
}

/// Incidente: Abierto → Cerrado
pub async fn close_incident(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
) -> ServiceResult<SecurityReport> {
    transition(state, user, id, ReportAction::Close, Action::Close).await
}

/// Permiso: Pendiente → Aprobado; notifies the reporter's area
pub async fn approve_permit(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
) -> ServiceResult<SecurityReport> {
    let report = transition(state, user, id, ReportAction::Approve, Action::Approve).await?;
    notify_reporter(state, &report, "Permiso aprobado").await;
    Ok(report)
}

/// Permiso: Pendiente → Rechazado; notifies the reporter's area
pub async fn reject_permit(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
) -> ServiceResult<SecurityReport> {
    let report = transition(state, user, id, ReportAction::Reject, Action::Reject).await?;
    notify_reporter(state, &report, "Permiso rechazado").await;
    Ok(report)
}

async fn notify_reporter(state: &AppState, report: &SecurityReport, title: &str) {
    notify_best_effort(
        state,
        NotificationCreate::new(report.reporter_area, title, report.title.clone())
            .with_link(REPORTS_LINK),
    )
    .await;
}

async fn transition(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
    action: ReportAction,
    policy_action: Action,
) -> ServiceResult<SecurityReport> {
    let current = state
        .store
        .find_report(id)
        .await?
        .ok_or_else(|| report_not_found(id))?;
    policy::ensure(user, policy_action, &Resource::SecurityReport { kind: current.kind })?;

    let report = state
        .store
        .transition_report(id, action, user.id, now_millis())
        .await?;

    tracing::info!(
        report_id = id,
        from = current.status.as_str(),
        to = report.status.as_str(),
        by = user.id,
        "Security report status changed"
    );
    state
        .live
        .publish(LiveEvent::ReportChanged(Box::new(report.clone())));
    Ok(report)
}

// =============================================================================
// Vehicles
// =============================================================================

pub async fn list_vehicles(
    state: &AppState,
    user: &CurrentUser,
) -> ServiceResult<Vec<RegisteredVehicle>> {
    policy::ensure(user, Action::Read, &Resource::Vehicle)?;
    state.store.list_vehicles().await
}

pub async fn register_vehicle(
    state: &AppState,
    user: &CurrentUser,
    data: VehicleCreate,
) -> ServiceResult<RegisteredVehicle> {
    policy::ensure(user, Action::Create, &Resource::Vehicle)?;

    let plate = normalize_plate(&data.plate);
    validate_required_text(&plate, "plate", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.owner, "owner", MAX_NAME_LEN)?;

    let vehicle = RegisteredVehicle {
        plate,
        description: data.description,
        owner: data.owner,
        area: data.area,
        created_at: now_millis(),
    };
    state.store.insert_vehicle(&vehicle).await?;
    tracing::info!(plate = %vehicle.plate, "Vehicle registered");
    Ok(vehicle)
}

/// Remove a vehicle; reports that named it keep their history without the link
pub async fn delete_vehicle(state: &AppState, user: &CurrentUser, plate: &str) -> ServiceResult<()> {
    policy::ensure(user, Action::Delete, &Resource::Vehicle)?;
    let plate = normalize_plate(plate);
    state.store.delete_vehicle(&plate).await?;
    tracing::info!(plate = %plate, "Vehicle removed");
    Ok(())
}
