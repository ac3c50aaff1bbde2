//! Fuel ledger
//!
//! Deposits (`Abastecimiento`) and dispatches (`Consumo`) append to the
//! history and move the running level in one store call, so the level always
//! equals the replayed ledger and two concurrent dispatches can never both
//! draw the same litres.

use rust_decimal::Decimal;
use shared::live::LiveEvent;
use shared::models::{
    Area, FuelHistoryEntry, FuelHistoryQuery, FuelLevel, FuelMovement, FuelMovementInput,
    NotificationCreate, normalize_plate, validate_quantity,
};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::db::{FuelMovementRecord, fuel_violation};
use crate::policy::{self, Action, Resource};
use crate::services::notifications::notify_best_effort;
use crate::state::AppState;
use crate::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, clamp_limit, validate_optional_text};
use crate::ServiceResult;

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;

/// Alert Combustible when a dispatch leaves less than this share of capacity
const LOW_LEVEL_RATIO: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

pub async fn levels(state: &AppState, user: &CurrentUser) -> ServiceResult<Vec<FuelLevel>> {
    policy::ensure(user, Action::Read, &Resource::Fuel)?;
    state.store.fuel_levels().await
}

pub async fn history(
    state: &AppState,
    user: &CurrentUser,
    mut query: FuelHistoryQuery,
) -> ServiceResult<Vec<FuelHistoryEntry>> {
    policy::ensure(user, Action::Read, &Resource::Fuel)?;
    query.limit = Some(clamp_limit(query.limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT));
    state.store.fuel_history(&query).await
}

/// Record an inbound delivery; fails if it would overflow the tank
pub async fn deposit(
    state: &AppState,
    user: &CurrentUser,
    data: FuelMovementInput,
) -> ServiceResult<FuelHistoryEntry> {
    policy::ensure(user, Action::Create, &Resource::Fuel)?;
    record(state, user, FuelMovement::Abastecimiento, data).await
}

/// Record an outbound dispatch; fails if the tank holds less than requested
pub async fn dispatch(
    state: &AppState,
    user: &CurrentUser,
    data: FuelMovementInput,
) -> ServiceResult<FuelHistoryEntry> {
    policy::ensure(user, Action::Dispatch, &Resource::Fuel)?;
    let entry = record(state, user, FuelMovement::Consumo, data).await?;

    let capacity = state
        .store
        .fuel_levels()
        .await
        .ok()
        .and_then(|levels| levels.into_iter().find(|l| l.fuel_type == entry.fuel_type))
        .map(|l| l.capacity);
    if let Some(capacity) = capacity
        && entry.level_after < capacity * LOW_LEVEL_RATIO
    {
        notify_best_effort(
            state,
            NotificationCreate::new(
                Area::Combustible,
                format!("Nivel bajo de {}", entry.fuel_type),
                format!(
                    "Quedan {} L de {} L tras el despacho",
                    entry.level_after.normalize(),
                    capacity.normalize()
                ),
            )
            .with_link("/combustible"),
        )
        .await;
    }
    Ok(entry)
}

async fn record(
    state: &AppState,
    user: &CurrentUser,
    movement: FuelMovement,
    data: FuelMovementInput,
) -> ServiceResult<FuelHistoryEntry> {
    validate_quantity(data.quantity).map_err(|v| fuel_violation(data.fuel_type, v))?;
    validate_optional_text(&data.vehicle_plate, "vehicle_plate", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.operator, "operator", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.notes, "notes", MAX_NOTE_LEN)?;

    let record = FuelMovementRecord {
        id: snowflake_id(),
        fuel_type: data.fuel_type,
        movement,
        quantity: data.quantity,
        vehicle_plate: data
            .vehicle_plate
            .as_deref()
            .map(normalize_plate)
            .filter(|p| !p.is_empty()),
        destination_area: data.destination_area,
        operator: data.operator,
        notes: data.notes,
        recorded_by: user.id,
        created_at: now_millis(),
    };
    let (entry, level) = state.store.record_fuel_movement(&record).await?;

    tracing::info!(
        fuel_type = %entry.fuel_type,
        movement = entry.movement.as_str(),
        quantity = %entry.quantity,
        level = %level.level,
        by = user.id,
        "Fuel movement recorded"
    );
    state.live.publish(LiveEvent::FuelLevelChanged(level));
    Ok(entry)
}
