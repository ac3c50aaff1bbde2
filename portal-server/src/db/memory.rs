//! In-memory store for tests
//!
//! All tables live behind one async mutex, so every trait call is atomic
//! with respect to the others, the same guarantee `PgStore` gets from its
//! transactions and row locks.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Area, Batch, ChatMessage, ChatQuery, Communication, CompanySettings, CompanySettingsUpdate,
    FuelHistoryEntry, FuelHistoryQuery, FuelLevel, FuelType, GalleryPost, InventoryItem,
    InventoryItemUpdate, InventoryQuery, ItemRecord, ManagedUser, Notification, Order, OrderAction,
    OrderQuery, OrderStatus, RegisteredVehicle, ReportAction, SecurityReport, SecurityReportQuery,
    UserStatus, UserUpdate, apply_movement, plan_consumption,
};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::{
    ContentRepository, FuelMovementRecord, FuelRepository, InventoryRepository,
    NotificationRepository, OrderRepository, SecurityRepository, SettingsRepository,
    UserCredentials, UserRepository, fuel_type_not_found, fuel_violation, insufficient_stock,
    invalid_order_transition, invalid_report_transition, order_not_found, product_not_found,
    report_not_found, user_not_found,
};
use crate::ServiceResult;

#[derive(Default)]
struct Tables {
    orders: BTreeMap<i64, Order>,
    items: BTreeMap<String, ItemRecord>,
    batches: Vec<Batch>,
    fuel_levels: Vec<FuelLevel>,
    fuel_history: Vec<FuelHistoryEntry>,
    notifications: Vec<Notification>,
    reports: Vec<SecurityReport>,
    vehicles: Vec<RegisteredVehicle>,
    users: Vec<(ManagedUser, String)>,
    gallery: Vec<GalleryPost>,
    communications: Vec<Communication>,
    chat: Vec<ChatMessage>,
    settings: CompanySettings,
}

impl Tables {
    fn item(&self, sku: &str) -> Option<InventoryItem> {
        let record = self.items.get(sku)?.clone();
        let batches = self
            .batches
            .iter()
            .filter(|b| b.item_sku == sku)
            .cloned()
            .collect();
        Some(InventoryItem::assemble(record, batches))
    }
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with both tanks at 0 L, same as a freshly migrated database
    pub fn new() -> Self {
        let tables = Tables {
            fuel_levels: vec![
                FuelLevel {
                    fuel_type: FuelType::Gasolina,
                    level: Decimal::ZERO,
                    capacity: Decimal::from(10_000),
                    updated_at: 0,
                },
                FuelLevel {
                    fuel_type: FuelType::Diesel,
                    level: Decimal::ZERO,
                    capacity: Decimal::from(20_000),
                    updated_at: 0,
                },
            ],
            ..Default::default()
        };
        Self {
            tables: Mutex::new(tables),
        }
    }
}

fn newest_first<T>(rows: &mut [T], created_at: impl Fn(&T) -> (i64, i64)) {
    rows.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, order: &Order) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        t.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order(&self, id: i64) -> ServiceResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, query: &OrderQuery) -> ServiceResult<Vec<Order>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<Order> = t
            .orders
            .values()
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .filter(|o| query.area.is_none_or(|a| o.requesting_area == a))
            .cloned()
            .collect();
        newest_first(&mut rows, |o| (o.created_at, o.id));
        Ok(rows)
    }

    async fn transition_order(
        &self,
        id: i64,
        action: OrderAction,
        rejection_reason: Option<&str>,
        now: i64,
    ) -> ServiceResult<Order> {
        let mut t = self.tables.lock().await;
        let current = t.orders.get(&id).ok_or_else(|| order_not_found(id))?.status;
        let next = action
            .apply(current)
            .ok_or_else(|| invalid_order_transition(id, action, current))?;

        if action == OrderAction::Dispatch {
            let mut demand: BTreeMap<String, i32> = BTreeMap::new();
            if let Some(order) = t.orders.get(&id) {
                for item in &order.items {
                    *demand.entry(item.product_sku.clone()).or_default() += item.quantity;
                }
            }
            let mut draws = Vec::new();
            for (sku, quantity) in &demand {
                let batches: Vec<Batch> = t
                    .batches
                    .iter()
                    .filter(|b| &b.item_sku == sku)
                    .cloned()
                    .collect();
                let plan = plan_consumption(&batches, *quantity)
                    .map_err(|shortfall| insufficient_stock(sku, shortfall))?;
                draws.extend(plan);
            }
            for draw in draws {
                if let Some(batch) = t.batches.iter_mut().find(|b| b.id == draw.batch_id) {
                    batch.quantity -= draw.take;
                }
            }
        }

        let order = t.orders.get_mut(&id).ok_or_else(|| order_not_found(id))?;
        order.status = next;
        order.updated_at = now;
        if next == OrderStatus::Rechazado {
            order.rejection_reason = rejection_reason.map(str::to_string);
        }
        Ok(order.clone())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn list_items(&self, query: &InventoryQuery) -> ServiceResult<Vec<InventoryItem>> {
        let t = self.tables.lock().await;
        Ok(t
            .items
            .values()
            .filter(|r| query.matches(r))
            .filter_map(|r| t.item(&r.sku))
            .collect())
    }

    async fn find_item(&self, sku: &str) -> ServiceResult<Option<InventoryItem>> {
        Ok(self.tables.lock().await.item(sku))
    }

    async fn low_stock_items(&self, threshold: i64) -> ServiceResult<Vec<InventoryItem>> {
        let t = self.tables.lock().await;
        Ok(t
            .items
            .keys()
            .filter_map(|sku| t.item(sku))
            .filter(|item| item.total_stock <= threshold)
            .collect())
    }

    async fn insert_item(
        &self,
        record: &ItemRecord,
        initial: Option<&Batch>,
    ) -> ServiceResult<InventoryItem> {
        let mut t = self.tables.lock().await;
        if t.items.contains_key(&record.sku) {
            return Err(AppError::new(ErrorCode::ProductSkuExists)
                .with_detail("sku", record.sku.as_str())
                .into());
        }
        t.items.insert(record.sku.clone(), record.clone());
        if let Some(batch) = initial {
            t.batches.push(batch.clone());
        }
        t.item(&record.sku)
            .ok_or_else(|| product_not_found(&record.sku).into())
    }

    async fn update_item(
        &self,
        sku: &str,
        update: &InventoryItemUpdate,
        now: i64,
    ) -> ServiceResult<InventoryItem> {
        let mut t = self.tables.lock().await;
        let record = t.items.get_mut(sku).ok_or_else(|| product_not_found(sku))?;
        if let Some(name) = &update.name {
            record.name = name.clone();
        }
        if let Some(description) = &update.description {
            record.description = Some(description.clone());
        }
        if let Some(unit) = &update.unit {
            record.unit = unit.clone();
        }
        if let Some(category) = &update.category {
            record.category = category.clone();
        }
        if let Some(location) = &update.location {
            record.location = Some(location.clone());
        }
        record.updated_at = now;
        t.item(sku).ok_or_else(|| product_not_found(sku).into())
    }

    async fn add_stock(&self, sku: &str, batch: &Batch, now: i64) -> ServiceResult<InventoryItem> {
        let mut t = self.tables.lock().await;
        let record = t.items.get_mut(sku).ok_or_else(|| product_not_found(sku))?;
        record.updated_at = now;
        match t
            .batches
            .iter_mut()
            .find(|b| b.item_sku == sku && b.lot_code == batch.lot_code)
        {
            Some(existing) => {
                existing.quantity += batch.quantity;
                if existing.expiry_date.is_none() {
                    existing.expiry_date = batch.expiry_date;
                }
            }
            None => t.batches.push(batch.clone()),
        }
        t.item(sku).ok_or_else(|| product_not_found(sku).into())
    }

    async fn delete_item(&self, sku: &str) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        if t.items.remove(sku).is_none() {
            return Err(product_not_found(sku).into());
        }
        t.batches.retain(|b| b.item_sku != sku);
        Ok(())
    }
}

#[async_trait]
impl FuelRepository for MemoryStore {
    async fn fuel_levels(&self) -> ServiceResult<Vec<FuelLevel>> {
        Ok(self.tables.lock().await.fuel_levels.clone())
    }

    async fn fuel_history(&self, query: &FuelHistoryQuery) -> ServiceResult<Vec<FuelHistoryEntry>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<FuelHistoryEntry> = t
            .fuel_history
            .iter()
            .filter(|e| query.fuel_type.is_none_or(|f| e.fuel_type == f))
            .cloned()
            .collect();
        newest_first(&mut rows, |e| (e.created_at, e.id));
        rows.truncate(query.limit.unwrap_or(i64::MAX).max(0) as usize);
        Ok(rows)
    }

    async fn record_fuel_movement(
        &self,
        record: &FuelMovementRecord,
    ) -> ServiceResult<(FuelHistoryEntry, FuelLevel)> {
        let mut t = self.tables.lock().await;
        let level = t
            .fuel_levels
            .iter_mut()
            .find(|l| l.fuel_type == record.fuel_type)
            .ok_or_else(|| fuel_type_not_found(record.fuel_type))?;
        let next = apply_movement(level, record.movement, record.quantity)
            .map_err(|v| fuel_violation(record.fuel_type, v))?;
        level.level = next;
        level.updated_at = record.created_at;
        let level = level.clone();

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
        t.fuel_history.push(entry.clone());
        Ok((entry, level))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> ServiceResult<()> {
        self.tables
            .lock()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn find_notification(&self, id: i64) -> ServiceResult<Option<Notification>> {
        let t = self.tables.lock().await;
        Ok(t.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn list_notifications(
        &self,
        area: Option<Area>,
        unread_only: bool,
        limit: i64,
    ) -> ServiceResult<Vec<Notification>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<Notification> = t
            .notifications
            .iter()
            .filter(|n| area.is_none_or(|a| n.recipient.reaches(a)))
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect();
        newest_first(&mut rows, |n| (n.created_at, n.id));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn mark_notification_read(&self, id: i64) -> ServiceResult<bool> {
        let mut t = self.tables.lock().await;
        match t.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, area: Area) -> ServiceResult<Vec<i64>> {
        let mut t = self.tables.lock().await;
        let mut changed = Vec::new();
        for n in t
            .notifications
            .iter_mut()
            .filter(|n| !n.read && n.recipient.reaches(area))
        {
            n.read = true;
            changed.push(n.id);
        }
        Ok(changed)
    }
}

#[async_trait]
impl SecurityRepository for MemoryStore {
    async fn insert_report(
        &self,
        report: &SecurityReport,
        vehicle: Option<&RegisteredVehicle>,
    ) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        if let Some(vehicle) = vehicle
            && !t.vehicles.iter().any(|v| v.plate == vehicle.plate)
        {
            t.vehicles.push(vehicle.clone());
        }
        t.reports.push(report.clone());
        Ok(())
    }

    async fn find_report(&self, id: i64) -> ServiceResult<Option<SecurityReport>> {
        let t = self.tables.lock().await;
        Ok(t.reports.iter().find(|r| r.id == id).cloned())
    }

    async fn list_reports(&self, query: &SecurityReportQuery) -> ServiceResult<Vec<SecurityReport>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<SecurityReport> = t
            .reports
            .iter()
            .filter(|r| query.kind.is_none_or(|k| r.kind == k))
            .filter(|r| query.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn transition_report(
        &self,
        id: i64,
        action: ReportAction,
        resolved_by: i64,
        now: i64,
    ) -> ServiceResult<SecurityReport> {
        let mut t = self.tables.lock().await;
        let report = t
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| report_not_found(id))?;
        let next = action
            .apply(report.kind, report.status)
            .ok_or_else(|| invalid_report_transition(id, report.status))?;
        report.status = next;
        report.resolved_by = Some(resolved_by);
        report.resolved_at = Some(now);
        Ok(report.clone())
    }

    async fn list_vehicles(&self) -> ServiceResult<Vec<RegisteredVehicle>> {
        let mut rows = self.tables.lock().await.vehicles.clone();
        rows.sort_by(|a, b| a.plate.cmp(&b.plate));
        Ok(rows)
    }

    async fn find_vehicle(&self, plate: &str) -> ServiceResult<Option<RegisteredVehicle>> {
        let t = self.tables.lock().await;
        Ok(t.vehicles.iter().find(|v| v.plate == plate).cloned())
    }

    async fn insert_vehicle(&self, vehicle: &RegisteredVehicle) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        if t.vehicles.iter().any(|v| v.plate == vehicle.plate) {
            return Err(AppError::new(ErrorCode::VehicleExists)
                .with_detail("plate", vehicle.plate.as_str())
                .into());
        }
        t.vehicles.push(vehicle.clone());
        Ok(())
    }

    async fn delete_vehicle(&self, plate: &str) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        let before = t.vehicles.len();
        t.vehicles.retain(|v| v.plate != plate);
        if t.vehicles.len() == before {
            return Err(AppError::new(ErrorCode::VehicleNotFound)
                .with_detail("plate", plate)
                .into());
        }
        for report in t
            .reports
            .iter_mut()
            .filter(|r| r.vehicle_plate.as_deref() == Some(plate))
        {
            report.vehicle_plate = None;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_credentials(&self, username: &str) -> ServiceResult<Option<UserCredentials>> {
        let t = self.tables.lock().await;
        Ok(t
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .map(|(user, hash)| UserCredentials {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn find_user(&self, id: i64) -> ServiceResult<Option<ManagedUser>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn list_users(&self) -> ServiceResult<Vec<ManagedUser>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<ManagedUser> = t.users.iter().map(|(u, _)| u.clone()).collect();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(rows)
    }

    async fn count_users(&self) -> ServiceResult<i64> {
        Ok(self.tables.lock().await.users.len() as i64)
    }

    async fn insert_user(&self, user: &ManagedUser, password_hash: &str) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        if t.users.iter().any(|(u, _)| u.username == user.username) {
            return Err(AppError::new(ErrorCode::UsernameExists)
                .with_detail("username", user.username.as_str())
                .into());
        }
        t.users.push((user.clone(), password_hash.to_string()));
        Ok(())
    }

    async fn activate_user(&self, id: i64) -> ServiceResult<ManagedUser> {
        let mut t = self.tables.lock().await;
        let (user, _) = t
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or_else(|| user_not_found(id))?;
        if user.status == UserStatus::Activo {
            return Err(AppError::new(ErrorCode::UserAlreadyActive).into());
        }
        user.status = UserStatus::Activo;
        Ok(user.clone())
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> ServiceResult<ManagedUser> {
        let mut t = self.tables.lock().await;
        let (user, _) = t
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or_else(|| user_not_found(id))?;
        if let Some(full_name) = &update.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(area) = update.area {
            user.area = area;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        let before = t.users.len();
        t.users.retain(|(u, _)| u.id != id);
        if t.users.len() == before {
            return Err(user_not_found(id).into());
        }
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for MemoryStore {
    async fn list_gallery_posts(&self, area: Option<Area>) -> ServiceResult<Vec<GalleryPost>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<GalleryPost> = t
            .gallery
            .iter()
            .filter(|p| area.is_none_or(|a| p.area == a))
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));
        Ok(rows)
    }

    async fn find_gallery_post(&self, id: i64) -> ServiceResult<Option<GalleryPost>> {
        let t = self.tables.lock().await;
        Ok(t.gallery.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_gallery_post(&self, post: &GalleryPost) -> ServiceResult<()> {
        self.tables.lock().await.gallery.push(post.clone());
        Ok(())
    }

    async fn delete_gallery_post(&self, id: i64) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        let before = t.gallery.len();
        t.gallery.retain(|p| p.id != id);
        if t.gallery.len() == before {
            return Err(AppError::new(ErrorCode::GalleryPostNotFound).into());
        }
        Ok(())
    }

    async fn list_communications(&self) -> ServiceResult<Vec<Communication>> {
        let mut rows = self.tables.lock().await.communications.clone();
        newest_first(&mut rows, |c| (c.created_at, c.id));
        Ok(rows)
    }

    async fn insert_communication(&self, communication: &Communication) -> ServiceResult<()> {
        self.tables
            .lock()
            .await
            .communications
            .push(communication.clone());
        Ok(())
    }

    async fn delete_communication(&self, id: i64) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        let before = t.communications.len();
        t.communications.retain(|c| c.id != id);
        if t.communications.len() == before {
            return Err(AppError::new(ErrorCode::CommunicationNotFound).into());
        }
        Ok(())
    }

    async fn list_chat_messages(
        &self,
        channel: &str,
        query: &ChatQuery,
        limit: i64,
    ) -> ServiceResult<Vec<ChatMessage>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<ChatMessage> = t
            .chat
            .iter()
            .filter(|m| m.channel == channel)
            .filter(|m| query.before.is_none_or(|b| m.created_at < b))
            .cloned()
            .collect();
        newest_first(&mut rows, |m| (m.created_at, m.id));
        rows.truncate(limit.max(0) as usize);
        rows.reverse();
        Ok(rows)
    }

    async fn insert_chat_message(&self, message: &ChatMessage) -> ServiceResult<()> {
        self.tables.lock().await.chat.push(message.clone());
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn get_settings(&self) -> ServiceResult<CompanySettings> {
        Ok(self.tables.lock().await.settings.clone())
    }

    async fn update_settings(
        &self,
        update: &CompanySettingsUpdate,
        now: i64,
    ) -> ServiceResult<CompanySettings> {
        let mut t = self.tables.lock().await;
        let settings = &mut t.settings;
        if let Some(name) = &update.company_name {
            settings.company_name = name.clone();
        }
        if let Some(logo_url) = &update.logo_url {
            settings.logo_url = Some(logo_url.clone());
        }
        if let Some(email) = &update.contact_email {
            settings.contact_email = Some(email.clone());
        }
        settings.updated_at = now;
        Ok(settings.clone())
    }
}
