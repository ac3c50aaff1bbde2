//! Security Log Model
//!
//! Two report kinds share one table with kind-dependent status machines:
//! - `Incidente`: Abierto → Cerrado
//! - `Permiso`: Pendiente → Aprobado | Rechazado

use serde::{Deserialize, Serialize};

use super::area::Area;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    Incidente,
    Permiso,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Incidente => "Incidente",
            ReportKind::Permiso => "Permiso",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Incidente" => Some(ReportKind::Incidente),
            "Permiso" => Some(ReportKind::Permiso),
            _ => None,
        }
    }

    pub fn initial_status(&self) -> ReportStatus {
        match self {
            ReportKind::Incidente => ReportStatus::Abierto,
            ReportKind::Permiso => ReportStatus::Pendiente,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Abierto,
    Cerrado,
    Pendiente,
    Aprobado,
    Rechazado,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Abierto => "Abierto",
            ReportStatus::Cerrado => "Cerrado",
            ReportStatus::Pendiente => "Pendiente",
            ReportStatus::Aprobado => "Aprobado",
            ReportStatus::Rechazado => "Rechazado",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Abierto" => Some(ReportStatus::Abierto),
            "Cerrado" => Some(ReportStatus::Cerrado),
            "Pendiente" => Some(ReportStatus::Pendiente),
            "Aprobado" => Some(ReportStatus::Aprobado),
            "Rechazado" => Some(ReportStatus::Rechazado),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportAction {
    Close,
    Approve,
    Reject,
}

impl ReportAction {
    /// Resolve the next status for a report of `kind` currently in `current`.
    pub fn apply(&self, kind: ReportKind, current: ReportStatus) -> Option<ReportStatus> {
        match (kind, current, self) {
            (ReportKind::Incidente, ReportStatus::Abierto, ReportAction::Close) => {
                Some(ReportStatus::Cerrado)
            }
            (ReportKind::Permiso, ReportStatus::Pendiente, ReportAction::Approve) => {
                Some(ReportStatus::Aprobado)
            }
            (ReportKind::Permiso, ReportStatus::Pendiente, ReportAction::Reject) => {
                Some(ReportStatus::Rechazado)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub id: i64,
    pub kind: ReportKind,
    pub status: ReportStatus,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub vehicle_plate: Option<String>,
    pub reported_by: i64,
    pub reported_by_name: String,
    pub reporter_area: Area,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReportCreate {
    pub kind: ReportKind,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub vehicle_plate: Option<String>,
    /// Used when the plate is not registered yet
    pub vehicle_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityReportQuery {
    pub kind: Option<ReportKind>,
    pub status: Option<ReportStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredVehicle {
    pub plate: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub area: Option<Area>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCreate {
    pub plate: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub area: Option<Area>,
}

/// Plates are stored upper-case without surrounding whitespace.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}
