//! Repository Module
//!
//! Each aggregate sits behind an async repository trait. [`PgStore`] is the
//! production implementation. Writes that must keep two tables consistent
//! (order status + batch quantities, fuel level + ledger, report + vehicle)
//! are a single trait call so the implementation can run them in one
//! transaction.

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Area, Batch, ChatMessage, ChatQuery, Communication, CompanySettings, CompanySettingsUpdate,
    FuelHistoryEntry, FuelHistoryQuery, FuelLevel, FuelMovement, FuelRuleViolation, FuelType,
    GalleryPost, InventoryItem, InventoryItemUpdate, ItemRecord, ManagedUser, Notification, Order,
    OrderAction, OrderQuery, OrderStatus, QUANTITY_SCALE, RegisteredVehicle, ReportAction,
    ReportStatus, SecurityReport, SecurityReportQuery, UserUpdate,
};

use crate::ServiceResult;

// =============================================================================
// Write records
// =============================================================================

/// Fuel movement to append; the store computes `level_after`
#[derive(Debug, Clone)]
pub struct FuelMovementRecord {
    pub id: i64,
    pub fuel_type: FuelType,
    pub movement: FuelMovement,
    pub quantity: Decimal,
    pub vehicle_plate: Option<String>,
    pub destination_area: Option<Area>,
    pub operator: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: i64,
    pub created_at: i64,
}

/// User row including the password hash
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: ManagedUser,
    pub password_hash: String,
}

// =============================================================================
// Repositories
// =============================================================================

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert an order with its items
    async fn insert_order(&self, order: &Order) -> ServiceResult<()>;
    async fn find_order(&self, id: i64) -> ServiceResult<Option<Order>>;
    /// Newest first
    async fn list_orders(&self, query: &OrderQuery) -> ServiceResult<Vec<Order>>;
    /// Conditional status change: succeeds only while the order is still in
    /// `action.expected_from()`. Dispatch also draws stock.
    async fn transition_order(
        &self,
        id: i64,
        action: OrderAction,
        rejection_reason: Option<&str>,
        now: i64,
    ) -> ServiceResult<Order>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn list_items(
        &self,
        query: &shared::models::InventoryQuery,
    ) -> ServiceResult<Vec<InventoryItem>>;
    async fn find_item(&self, sku: &str) -> ServiceResult<Option<InventoryItem>>;
    /// Every item whose summed batch stock is at most `threshold`, uncapped
    async fn low_stock_items(&self, threshold: i64) -> ServiceResult<Vec<InventoryItem>>;
    /// Insert an item and its optional first batch
    async fn insert_item(
        &self,
        record: &ItemRecord,
        initial: Option<&Batch>,
    ) -> ServiceResult<InventoryItem>;
    async fn update_item(
        &self,
        sku: &str,
        update: &InventoryItemUpdate,
        now: i64,
    ) -> ServiceResult<InventoryItem>;
    /// Increment the batch with the same lot code, or insert `batch`
    async fn add_stock(&self, sku: &str, batch: &Batch, now: i64) -> ServiceResult<InventoryItem>;
    async fn delete_item(&self, sku: &str) -> ServiceResult<()>;
}

#[async_trait]
pub trait FuelRepository: Send + Sync {
    async fn fuel_levels(&self) -> ServiceResult<Vec<FuelLevel>>;
    /// Newest first
    async fn fuel_history(&self, query: &FuelHistoryQuery) -> ServiceResult<Vec<FuelHistoryEntry>>;
    /// Append a ledger entry and move the running level, atomically
    async fn record_fuel_movement(
        &self,
        record: &FuelMovementRecord,
    ) -> ServiceResult<(FuelHistoryEntry, FuelLevel)>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> ServiceResult<()>;
    async fn find_notification(&self, id: i64) -> ServiceResult<Option<Notification>>;
    /// Rows addressed to `area` or broadcast, newest first; `None` lists all
    async fn list_notifications(
        &self,
        area: Option<Area>,
        unread_only: bool,
        limit: i64,
    ) -> ServiceResult<Vec<Notification>>;
    /// Returns `false` when the row does not exist
    async fn mark_notification_read(&self, id: i64) -> ServiceResult<bool>;
    /// Mark every unread row visible to `area`; returns the ids changed
    async fn mark_all_notifications_read(&self, area: Area) -> ServiceResult<Vec<i64>>;
}

#[async_trait]
pub trait SecurityRepository: Send + Sync {
    /// Insert a report; `vehicle` is registered in the same transaction when
    /// its plate is not known yet
    async fn insert_report(
        &self,
        report: &SecurityReport,
        vehicle: Option<&RegisteredVehicle>,
    ) -> ServiceResult<()>;
    async fn find_report(&self, id: i64) -> ServiceResult<Option<SecurityReport>>;
    async fn list_reports(&self, query: &SecurityReportQuery) -> ServiceResult<Vec<SecurityReport>>;
    async fn transition_report(
        &self,
        id: i64,
        action: ReportAction,
        resolved_by: i64,
        now: i64,
    ) -> ServiceResult<SecurityReport>;
    async fn list_vehicles(&self) -> ServiceResult<Vec<RegisteredVehicle>>;
    async fn find_vehicle(&self, plate: &str) -> ServiceResult<Option<RegisteredVehicle>>;
    async fn insert_vehicle(&self, vehicle: &RegisteredVehicle) -> ServiceResult<()>;
    async fn delete_vehicle(&self, plate: &str) -> ServiceResult<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_credentials(&self, username: &str) -> ServiceResult<Option<UserCredentials>>;
    async fn find_user(&self, id: i64) -> ServiceResult<Option<ManagedUser>>;
    async fn list_users(&self) -> ServiceResult<Vec<ManagedUser>>;
    async fn count_users(&self) -> ServiceResult<i64>;
    async fn insert_user(&self, user: &ManagedUser, password_hash: &str) -> ServiceResult<()>;
    /// Pendiente → Activo
    async fn activate_user(&self, id: i64) -> ServiceResult<ManagedUser>;
    async fn update_user(&self, id: i64, update: &UserUpdate) -> ServiceResult<ManagedUser>;
    async fn delete_user(&self, id: i64) -> ServiceResult<()>;
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn list_gallery_posts(&self, area: Option<Area>) -> ServiceResult<Vec<GalleryPost>>;
    async fn find_gallery_post(&self, id: i64) -> ServiceResult<Option<GalleryPost>>;
    async fn insert_gallery_post(&self, post: &GalleryPost) -> ServiceResult<()>;
    async fn delete_gallery_post(&self, id: i64) -> ServiceResult<()>;

    async fn list_communications(&self) -> ServiceResult<Vec<Communication>>;
    async fn insert_communication(&self, communication: &Communication) -> ServiceResult<()>;
    async fn delete_communication(&self, id: i64) -> ServiceResult<()>;

    /// Latest `limit` messages (older than `before` if set), oldest first
    async fn list_chat_messages(
        &self,
        channel: &str,
        query: &ChatQuery,
        limit: i64,
    ) -> ServiceResult<Vec<ChatMessage>>;
    async fn insert_chat_message(&self, message: &ChatMessage) -> ServiceResult<()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_settings(&self) -> ServiceResult<CompanySettings>;
    async fn update_settings(
        &self,
        update: &CompanySettingsUpdate,
        now: i64,
    ) -> ServiceResult<CompanySettings>;
}

/// Every repository behind one handle
pub trait Store:
    OrderRepository
    + InventoryRepository
    + FuelRepository
    + NotificationRepository
    + SecurityRepository
    + UserRepository
    + ContentRepository
    + SettingsRepository
{
}

impl<T> Store for T where
    T: OrderRepository
        + InventoryRepository
        + FuelRepository
        + NotificationRepository
        + SecurityRepository
        + UserRepository
        + ContentRepository
        + SettingsRepository
{
}

// =============================================================================
// Shared error constructors
// =============================================================================

pub(crate) fn order_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id)
}

pub(crate) fn invalid_order_transition(
    id: i64,
    action: OrderAction,
    current: OrderStatus,
) -> AppError {
    AppError::with_message(
        ErrorCode::OrderInvalidTransition,
        format!(
            "Cannot {} an order in status {current}",
            action_verb(action)
        ),
    )
    .with_detail("order_id", id)
    .with_detail("status", current.as_str())
}

fn action_verb(action: OrderAction) -> &'static str {
    match action {
        OrderAction::Approve => "approve",
        OrderAction::Reject => "reject",
        OrderAction::Dispatch => "dispatch",
    }
}

pub(crate) fn product_not_found(sku: &str) -> AppError {
    AppError::new(ErrorCode::ProductNotFound).with_detail("sku", sku)
}

pub(crate) fn insufficient_stock(sku: &str, shortfall: i64) -> AppError {
    AppError::with_message(
        ErrorCode::InsufficientStock,
        format!("Insufficient stock for {sku}"),
    )
    .with_detail("sku", sku)
    .with_detail("shortfall", shortfall)
}

pub(crate) fn fuel_type_not_found(fuel_type: FuelType) -> AppError {
    AppError::new(ErrorCode::FuelTypeNotFound).with_detail("fuel_type", fuel_type.as_str())
}

pub(crate) fn fuel_violation(fuel_type: FuelType, violation: FuelRuleViolation) -> AppError {
    match violation {
        FuelRuleViolation::NonPositiveQuantity => AppError::new(ErrorCode::FuelInvalidQuantity),
        FuelRuleViolation::TooPrecise => AppError::with_message(
            ErrorCode::FuelInvalidQuantity,
            format!("Fuel quantity allows at most {QUANTITY_SCALE} decimal places"),
        )
        .with_detail("fuel_type", fuel_type.as_str()),
        FuelRuleViolation::Insufficient {
            available,
            requested,
        } => AppError::with_message(
            ErrorCode::InsufficientFuel,
            format!("Only {available} L of {fuel_type} available, {requested} L requested"),
        )
        .with_detail("fuel_type", fuel_type.as_str())
        .with_detail("available", available.to_string())
        .with_detail("requested", requested.to_string()),
        FuelRuleViolation::CapacityExceeded {
            capacity,
            free,
            requested,
        } => AppError::with_message(
            ErrorCode::FuelCapacityExceeded,
            format!("{fuel_type} tank holds {capacity} L with {free} L free, {requested} L requested"),
        )
        .with_detail("fuel_type", fuel_type.as_str())
        .with_detail("capacity", capacity.to_string())
        .with_detail("free", free.to_string()),
    }
}

pub(crate) fn report_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::ReportNotFound).with_detail("report_id", id)
}

pub(crate) fn invalid_report_transition(id: i64, current: ReportStatus) -> AppError {
    AppError::with_message(
        ErrorCode::ReportInvalidTransition,
        format!("Report is {}", current.as_str()),
    )
    .with_detail("report_id", id)
    .with_detail("status", current.as_str())
}

pub(crate) fn user_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::UserNotFound).with_detail("user_id", id)
}
