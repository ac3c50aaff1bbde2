//! Area Model
//!
//! An area is both a user attribute and a routing target for orders and
//! notifications.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Organizational department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Area {
    #[serde(rename = "Almacén")]
    Almacen,
    #[serde(rename = "Administración")]
    Administracion,
    Seguridad,
    #[serde(rename = "Producción")]
    Produccion,
    Mantenimiento,
    Combustible,
    Gerencia,
}

impl Area {
    pub const ALL: [Area; 7] = [
        Area::Almacen,
        Area::Administracion,
        Area::Seguridad,
        Area::Produccion,
        Area::Mantenimiento,
        Area::Combustible,
        Area::Gerencia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Almacen => "Almacén",
            Area::Administracion => "Administración",
            Area::Seguridad => "Seguridad",
            Area::Produccion => "Producción",
            Area::Mantenimiento => "Mantenimiento",
            Area::Combustible => "Combustible",
            Area::Gerencia => "Gerencia",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broadcast sentinel stored in the `recipient` column
pub const BROADCAST_RECIPIENT: &str = "Todos";

/// Notification recipient: a single area or everyone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Recipient {
    Area(Area),
    Broadcast,
}

impl Recipient {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recipient::Area(area) => area.as_str(),
            Recipient::Broadcast => BROADCAST_RECIPIENT,
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        if s == BROADCAST_RECIPIENT {
            Some(Recipient::Broadcast)
        } else {
            Area::from_db(s).map(Recipient::Area)
        }
    }

    /// Whether a reader from `area` should see this row
    pub fn reaches(&self, area: Area) -> bool {
        match self {
            Recipient::Broadcast => true,
            Recipient::Area(a) => *a == area,
        }
    }
}

impl From<Area> for Recipient {
    fn from(area: Area) -> Self {
        Recipient::Area(area)
    }
}

impl From<Recipient> for String {
    fn from(r: Recipient) -> Self {
        r.as_str().to_string()
    }
}

impl TryFrom<String> for Recipient {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Recipient::from_db(&value).ok_or_else(|| format!("unknown recipient: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_db_roundtrip() {
        for area in Area::ALL {
            assert_eq!(Area::from_db(area.as_str()), Some(area));
        }
        assert_eq!(Area::from_db("Almacen"), None);
    }

    #[test]
    fn area_serializes_with_accents() {
        assert_eq!(serde_json::to_string(&Area::Almacen).unwrap(), "\"Almacén\"");
        let area: Area = serde_json::from_str("\"Producción\"").unwrap();
        assert_eq!(area, Area::Produccion);
    }

    #[test]
    fn recipient_reaches() {
        assert!(Recipient::Broadcast.reaches(Area::Seguridad));
        assert!(Recipient::Area(Area::Almacen).reaches(Area::Almacen));
        assert!(!Recipient::Area(Area::Almacen).reaches(Area::Gerencia));
    }

    #[test]
    fn recipient_serde() {
        assert_eq!(
            serde_json::to_string(&Recipient::Broadcast).unwrap(),
            "\"Todos\""
        );
        let r: Recipient = serde_json::from_str("\"Combustible\"").unwrap();
        assert_eq!(r, Recipient::Area(Area::Combustible));
        assert!(serde_json::from_str::<Recipient>("\"Cocina\"").is_err());
    }
}
