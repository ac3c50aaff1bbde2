//! Fuel Ledger Model
//!
//! Append-only history (`Abastecimiento` inbound, `Consumo` outbound) plus a
//! running level row per fuel type. The level must always equal the initial
//! level plus the signed sum of the history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::area::Area;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Gasolina,
    Diesel,
}

impl FuelType {
    pub const ALL: [FuelType; 2] = [FuelType::Gasolina, FuelType::Diesel];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Gasolina => "Gasolina",
            FuelType::Diesel => "Diesel",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Gasolina" => Some(FuelType::Gasolina),
            "Diesel" => Some(FuelType::Diesel),
            _ => None,
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelMovement {
    Abastecimiento,
    Consumo,
}

impl FuelMovement {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelMovement::Abastecimiento => "Abastecimiento",
            FuelMovement::Consumo => "Consumo",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Abastecimiento" => Some(FuelMovement::Abastecimiento),
            "Consumo" => Some(FuelMovement::Consumo),
            _ => None,
        }
    }

    /// Signed contribution of `quantity` to the running level
    pub fn signed(&self, quantity: Decimal) -> Decimal {
        match self {
            FuelMovement::Abastecimiento => quantity,
            FuelMovement::Consumo => -quantity,
        }
    }
}

/// Litres are stored as `NUMERIC(12,2)`
pub const QUANTITY_SCALE: u32 = 2;

/// Running level row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLevel {
    pub fuel_type: FuelType,
    #[serde(with = "rust_decimal::serde::float")]
    pub level: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub capacity: Decimal,
    pub updated_at: i64,
}

/// Ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelHistoryEntry {
    pub id: i64,
    pub fuel_type: FuelType,
    pub movement: FuelMovement,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub level_after: Decimal,
    pub vehicle_plate: Option<String>,
    pub destination_area: Option<Area>,
    pub operator: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: i64,
    pub created_at: i64,
}

/// Deposit / dispatch payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelMovementInput {
    pub fuel_type: FuelType,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    pub vehicle_plate: Option<String>,
    pub destination_area: Option<Area>,
    pub operator: Option<String>,
    pub notes: Option<String>,
}

/// History filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuelHistoryQuery {
    pub fuel_type: Option<FuelType>,
    pub limit: Option<i64>,
}

/// Why a movement cannot be applied to a level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelRuleViolation {
    NonPositiveQuantity,
    /// More decimal places than [`QUANTITY_SCALE`]
    TooPrecise,
    Insufficient { available: Decimal, requested: Decimal },
    CapacityExceeded { capacity: Decimal, free: Decimal, requested: Decimal },
}

/// Check a quantity before it reaches the store
pub fn validate_quantity(quantity: Decimal) -> Result<(), FuelRuleViolation> {
    if quantity <= Decimal::ZERO {
        return Err(FuelRuleViolation::NonPositiveQuantity);
    }
    if quantity.normalize().scale() > QUANTITY_SCALE {
        return Err(FuelRuleViolation::TooPrecise);
    }
    Ok(())
}

/// Compute the level after applying `movement` of `quantity`.
pub fn apply_movement(
    level: &FuelLevel,
    movement: FuelMovement,
    quantity: Decimal,
) -> Result<Decimal, FuelRuleViolation> {
    validate_quantity(quantity)?;
    match movement {
        FuelMovement::Consumo if quantity > level.level => Err(FuelRuleViolation::Insufficient {
            available: level.level,
            requested: quantity,
        }),
        FuelMovement::Consumo => Ok(level.level - quantity),
        FuelMovement::Abastecimiento => {
            // compared against free space so huge deposits cannot overflow
            let free = (level.capacity - level.level).max(Decimal::ZERO);
            if quantity > free {
                return Err(FuelRuleViolation::CapacityExceeded {
                    capacity: level.capacity,
                    free,
                    requested: quantity,
                });
            }
            Ok(level.level + quantity)
        }
    }
}

/// Level implied by replaying `entries` of one fuel type on top of `initial`.
pub fn ledger_level(initial: Decimal, entries: &[FuelHistoryEntry]) -> Decimal {
    entries
        .iter()
        .fold(initial, |acc, e| acc + e.movement.signed(e.quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(l: i64, cap: i64) -> FuelLevel {
        FuelLevel {
            fuel_type: FuelType::Gasolina,
            level: Decimal::from(l),
            capacity: Decimal::from(cap),
            updated_at: 0,
        }
    }

    fn entry(movement: FuelMovement, qty: i64) -> FuelHistoryEntry {
        FuelHistoryEntry {
            id: 0,
            fuel_type: FuelType::Gasolina,
            movement,
            quantity: Decimal::from(qty),
            level_after: Decimal::ZERO,
            vehicle_plate: None,
            destination_area: None,
            operator: None,
            notes: None,
            recorded_by: 1,
            created_at: 0,
        }
    }

    #[test]
    fn dispatch_within_level() {
        let next = apply_movement(&level(100, 1000), FuelMovement::Consumo, Decimal::from(30));
        assert_eq!(next, Ok(Decimal::from(70)));
    }

    #[test]
    fn dispatch_exceeding_level_is_rejected() {
        let result = apply_movement(&level(70, 1000), FuelMovement::Consumo, Decimal::from(80));
        assert_eq!(
            result,
            Err(FuelRuleViolation::Insufficient {
                available: Decimal::from(70),
                requested: Decimal::from(80),
            })
        );
    }

    #[test]
    fn dispatch_of_exact_level_drains_tank() {
        let next = apply_movement(&level(70, 1000), FuelMovement::Consumo, Decimal::from(70));
        assert_eq!(next, Ok(Decimal::ZERO));
    }

    #[test]
    fn deposit_respects_capacity() {
        assert_eq!(
            apply_movement(&level(900, 1000), FuelMovement::Abastecimiento, Decimal::from(100)),
            Ok(Decimal::from(1000))
        );
        assert!(matches!(
            apply_movement(&level(900, 1000), FuelMovement::Abastecimiento, Decimal::from(101)),
            Err(FuelRuleViolation::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        for qty in [Decimal::ZERO, Decimal::from(-5)] {
            for movement in [FuelMovement::Abastecimiento, FuelMovement::Consumo] {
                assert_eq!(
                    apply_movement(&level(50, 100), movement, qty),
                    Err(FuelRuleViolation::NonPositiveQuantity)
                );
            }
        }
    }

    #[test]
    fn ledger_replay_matches_running_level() {
        let entries = vec![
            entry(FuelMovement::Abastecimiento, 200),
            entry(FuelMovement::Consumo, 30),
            entry(FuelMovement::Abastecimiento, 15),
            entry(FuelMovement::Consumo, 85),
        ];
        assert_eq!(ledger_level(Decimal::from(100), &entries), Decimal::from(200));
    }

    #[test]
    fn huge_deposit_is_a_capacity_violation() {
        let result = apply_movement(&level(100, 1000), FuelMovement::Abastecimiento, Decimal::MAX);
        assert_eq!(
            result,
            Err(FuelRuleViolation::CapacityExceeded {
                capacity: Decimal::from(1000),
                free: Decimal::from(900),
                requested: Decimal::MAX,
            })
        );
    }

    #[test]
    fn quantities_beyond_centilitres_are_rejected() {
        assert_eq!(
            apply_movement(&level(100, 1000), FuelMovement::Consumo, Decimal::new(335, 3)),
            Err(FuelRuleViolation::TooPrecise)
        );
        // trailing zeros do not count
        assert_eq!(
            apply_movement(&level(100, 1000), FuelMovement::Consumo, Decimal::new(3300, 4)),
            Ok(Decimal::new(9967, 2))
        );
    }

    #[test]
    fn wire_format_uses_numbers() {
        let json = serde_json::to_value(level(70, 1000)).unwrap();
        assert_eq!(json["level"].as_f64(), Some(70.0));
        assert_eq!(json["capacity"].as_f64(), Some(1000.0));

        let input: FuelMovementInput =
            serde_json::from_value(serde_json::json!({"fuel_type": "Diesel", "quantity": 12.5}))
                .unwrap();
        assert_eq!(input.quantity, Decimal::new(125, 1));
    }

    #[test]
    fn fractional_litres() {
        let next = apply_movement(&level(10, 100), FuelMovement::Consumo, Decimal::new(25, 1));
        assert_eq!(next, Ok(Decimal::new(75, 1)));
    }
}
