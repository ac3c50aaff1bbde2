//! Managed User Model

use serde::{Deserialize, Serialize};

use super::area::Area;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Administrador,
    Usuario,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Administrador => "Administrador",
            UserRole::Usuario => "Usuario",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Administrador" => Some(UserRole::Administrador),
            "Usuario" => Some(UserRole::Usuario),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    Activo,
    Pendiente,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Activo => "Activo",
            UserStatus::Pendiente => "Pendiente",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Activo" => Some(UserStatus::Activo),
            "Pendiente" => Some(UserStatus::Pendiente),
            _ => None,
        }
    }

    pub fn can_login(&self) -> bool {
        matches!(self, UserStatus::Activo)
    }
}

/// User account as exposed over the API (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub area: Area,
    pub status: UserStatus,
    pub created_at: i64,
}

/// Self-registration payload (account starts as `Pendiente`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegister {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub area: Area,
}

/// Admin creation payload (account starts as `Activo`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub role: UserRole,
    pub area: Area,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub area: Option<Area>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: ManagedUser,
}
