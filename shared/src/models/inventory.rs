//! Inventory Model
//!
//! An item is keyed by SKU and owns one or more batches (lots). The stock
//! status label is derived from the summed batch quantity on every read and
//! never stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the "Poco Stock" band
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Derived stock status label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "En Stock")]
    EnStock,
    #[serde(rename = "Poco Stock")]
    PocoStock,
    Agotado,
}

impl StockStatus {
    /// 0 ⇒ Agotado, 1..=10 ⇒ Poco Stock, >10 ⇒ En Stock
    pub fn from_stock(total: i64) -> Self {
        if total <= 0 {
            StockStatus::Agotado
        } else if total <= LOW_STOCK_THRESHOLD {
            StockStatus::PocoStock
        } else {
            StockStatus::EnStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::EnStock => "En Stock",
            StockStatus::PocoStock => "Poco Stock",
            StockStatus::Agotado => "Agotado",
        }
    }
}

/// Lot record of an inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    pub item_sku: String,
    pub lot_code: String,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub received_at: i64,
}

/// Persisted item fields (no batches, no derived values)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub category: String,
    pub location: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Inventory item as returned to readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub record: ItemRecord,
    pub batches: Vec<Batch>,
    pub total_stock: i64,
    pub status: StockStatus,
}

impl InventoryItem {
    /// Attach batches and compute derived stock figures.
    pub fn assemble(record: ItemRecord, batches: Vec<Batch>) -> Self {
        let total_stock = total_stock(&batches);
        Self {
            record,
            batches,
            total_stock,
            status: StockStatus::from_stock(total_stock),
        }
    }

    pub fn sku(&self) -> &str {
        &self.record.sku
    }
}

pub fn total_stock(batches: &[Batch]) -> i64 {
    batches.iter().map(|b| i64::from(b.quantity)).sum()
}

/// One step of a stock consumption plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchDraw {
    pub batch_id: i64,
    pub take: i32,
}

/// Plan consuming `quantity` units first-expired-first-out.
///
/// Batches with an expiry date go before undated ones; ties fall back to the
/// oldest `received_at`, then batch id. Returns the shortfall on failure.
pub fn plan_consumption(batches: &[Batch], quantity: i32) -> Result<Vec<BatchDraw>, i64> {
    let available = total_stock(batches);
    if i64::from(quantity) > available {
        return Err(i64::from(quantity) - available);
    }

    let mut ordered: Vec<&Batch> = batches.iter().filter(|b| b.quantity > 0).collect();
    ordered.sort_by(|a, b| {
        let expiry = match (a.expiry_date, b.expiry_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        expiry
            .then(a.received_at.cmp(&b.received_at))
            .then(a.id.cmp(&b.id))
    });

    let mut remaining = quantity;
    let mut plan = Vec::new();
    for batch in ordered {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch.quantity);
        plan.push(BatchDraw {
            batch_id: batch.id,
            take,
        });
        remaining -= take;
    }
    Ok(plan)
}

/// Stock intake payload: increments the batch with the same lot code, or
/// creates a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdd {
    pub lot_code: String,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
}

/// Create item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemCreate {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub category: String,
    pub location: Option<String>,
    pub initial_stock: Option<StockAdd>,
}

/// Update item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
}

/// List filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryQuery {
    pub category: Option<String>,
    /// Case-insensitive match on SKU or name
    pub search: Option<String>,
}

impl InventoryQuery {
    pub fn matches(&self, record: &ItemRecord) -> bool {
        if let Some(category) = &self.category
            && !record.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            return record.sku.to_lowercase().contains(&needle)
                || record.name.to_lowercase().contains(&needle);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(id: i64, qty: i32, expiry: Option<&str>, received_at: i64) -> Batch {
        Batch {
            id,
            item_sku: "FER-001".to_string(),
            lot_code: format!("L{id}"),
            quantity: qty,
            expiry_date: expiry.map(|d| d.parse().unwrap()),
            received_at,
        }
    }

    fn record() -> ItemRecord {
        ItemRecord {
            sku: "FER-001".to_string(),
            name: "Fertilizante NPK".to_string(),
            description: None,
            unit: "saco".to_string(),
            category: "Fertilizantes".to_string(),
            location: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(StockStatus::from_stock(0), StockStatus::Agotado);
        assert_eq!(StockStatus::from_stock(1), StockStatus::PocoStock);
        assert_eq!(StockStatus::from_stock(10), StockStatus::PocoStock);
        assert_eq!(StockStatus::from_stock(11), StockStatus::EnStock);
        assert_eq!(StockStatus::from_stock(-3), StockStatus::Agotado);
    }

    #[test]
    fn status_is_derived_from_all_batches() {
        let item = InventoryItem::assemble(
            record(),
            vec![batch(1, 4, None, 1), batch(2, 7, None, 2)],
        );
        assert_eq!(item.total_stock, 11);
        assert_eq!(item.status, StockStatus::EnStock);

        let empty = InventoryItem::assemble(record(), vec![]);
        assert_eq!(empty.total_stock, 0);
        assert_eq!(empty.status, StockStatus::Agotado);
    }

    #[test]
    fn serialized_item_is_flat() {
        let item = InventoryItem::assemble(record(), vec![batch(1, 5, None, 1)]);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["sku"], "FER-001");
        assert_eq!(json["status"], "Poco Stock");
        assert_eq!(json["total_stock"], 5);
    }

    #[test]
    fn consumption_prefers_earliest_expiry() {
        let batches = vec![
            batch(1, 5, None, 1),
            batch(2, 3, Some("2026-12-01"), 5),
            batch(3, 4, Some("2026-11-01"), 9),
        ];
        let plan = plan_consumption(&batches, 6).unwrap();
        assert_eq!(
            plan,
            vec![
                BatchDraw { batch_id: 3, take: 4 },
                BatchDraw { batch_id: 2, take: 2 },
            ]
        );
    }

    #[test]
    fn consumption_falls_back_to_oldest_received() {
        let batches = vec![batch(7, 2, None, 20), batch(8, 2, None, 10)];
        let plan = plan_consumption(&batches, 3).unwrap();
        assert_eq!(plan[0], BatchDraw { batch_id: 8, take: 2 });
        assert_eq!(plan[1], BatchDraw { batch_id: 7, take: 1 });
    }

    #[test]
    fn consumption_reports_shortfall() {
        let batches = vec![batch(1, 5, None, 1)];
        assert_eq!(plan_consumption(&batches, 8), Err(3));
        assert_eq!(plan_consumption(&batches, 5).unwrap().len(), 1);
    }

    #[test]
    fn query_matching() {
        let q = InventoryQuery {
            category: Some("fertilizantes".to_string()),
            search: Some("npk".to_string()),
        };
        assert!(q.matches(&record()));

        let q = InventoryQuery {
            category: Some("Semillas".to_string()),
            search: None,
        };
        assert!(!q.matches(&record()));
    }
}
