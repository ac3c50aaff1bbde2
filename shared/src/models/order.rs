//! Purchase Order Model
//!
//! Status machine:
//!
//! ```text
//! Pendiente ──approve──▶ Aprobado ──dispatch──▶ Despachado
//!     │
//!     └──reject──▶ Rechazado
//! ```
//!
//! Nothing ever returns to `Pendiente`; `Rechazado` and `Despachado` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::area::Area;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pendiente,
    Aprobado,
    Rechazado,
    Despachado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "Pendiente",
            OrderStatus::Aprobado => "Aprobado",
            OrderStatus::Rechazado => "Rechazado",
            OrderStatus::Despachado => "Despachado",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Pendiente" => Some(OrderStatus::Pendiente),
            "Aprobado" => Some(OrderStatus::Aprobado),
            "Rechazado" => Some(OrderStatus::Rechazado),
            "Despachado" => Some(OrderStatus::Despachado),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Rechazado | OrderStatus::Despachado)
    }

    /// Position along the workflow; transitions must strictly increase it.
    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pendiente => 0,
            OrderStatus::Aprobado | OrderStatus::Rechazado => 1,
            OrderStatus::Despachado => 2,
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pendiente, OrderStatus::Aprobado)
                | (OrderStatus::Pendiente, OrderStatus::Rechazado)
                | (OrderStatus::Aprobado, OrderStatus::Despachado)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow action applied to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Approve,
    Reject,
    Dispatch,
}

impl OrderAction {
    /// Status the order must currently be in
    pub fn expected_from(&self) -> OrderStatus {
        match self {
            OrderAction::Approve | OrderAction::Reject => OrderStatus::Pendiente,
            OrderAction::Dispatch => OrderStatus::Aprobado,
        }
    }

    /// Status after the action succeeds
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Approve => OrderStatus::Aprobado,
            OrderAction::Reject => OrderStatus::Rechazado,
            OrderAction::Dispatch => OrderStatus::Despachado,
        }
    }

    /// Resolve the next status, or `None` if the action is not allowed from `current`.
    pub fn apply(&self, current: OrderStatus) -> Option<OrderStatus> {
        if current == self.expected_from() && current.can_transition_to(self.target()) {
            Some(self.target())
        } else {
            None
        }
    }
}

/// Order line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub position: i32,
    pub product_sku: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit: String,
    pub destination_area: Area,
    pub notes: Option<String>,
}

/// Purchase order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub status: OrderStatus,
    pub requesting_area: Area,
    pub requested_by: i64,
    pub requested_by_name: String,
    pub rejection_reason: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Line item of a create-order request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_sku: String,
    pub quantity: i32,
    pub destination_area: Area,
    pub notes: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    /// Defaults to the caller's own area
    pub requesting_area: Option<Area>,
    pub items: Vec<OrderItemInput>,
}

/// Reject order payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderReject {
    pub reason: Option<String>,
}

/// List filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub area: Option<Area>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 4] = [
        OrderStatus::Pendiente,
        OrderStatus::Aprobado,
        OrderStatus::Rechazado,
        OrderStatus::Despachado,
    ];

    #[test]
    fn transitions_only_move_forward() {
        for from in ALL {
            for to in ALL {
                if from.can_transition_to(to) {
                    assert!(to.rank() > from.rank(), "{from} -> {to} must move forward");
                }
            }
        }
    }

    #[test]
    fn nothing_returns_to_pendiente() {
        for from in ALL {
            assert!(!from.can_transition_to(OrderStatus::Pendiente));
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn actions_resolve_against_current_status() {
        assert_eq!(
            OrderAction::Approve.apply(OrderStatus::Pendiente),
            Some(OrderStatus::Aprobado)
        );
        assert_eq!(
            OrderAction::Reject.apply(OrderStatus::Pendiente),
            Some(OrderStatus::Rechazado)
        );
        assert_eq!(
            OrderAction::Dispatch.apply(OrderStatus::Aprobado),
            Some(OrderStatus::Despachado)
        );

        assert_eq!(OrderAction::Dispatch.apply(OrderStatus::Pendiente), None);
        assert_eq!(OrderAction::Approve.apply(OrderStatus::Aprobado), None);
        assert_eq!(OrderAction::Reject.apply(OrderStatus::Despachado), None);
        assert_eq!(OrderAction::Dispatch.apply(OrderStatus::Rechazado), None);
    }

    #[test]
    fn status_db_roundtrip() {
        for s in ALL {
            assert_eq!(OrderStatus::from_db(s.as_str()), Some(s));
        }
        assert_eq!(OrderStatus::from_db("Cancelado"), None);
    }
}
