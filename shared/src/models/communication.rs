//! Company Announcement Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    #[default]
    Normal,
    Importante,
    Urgente,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "Normal",
            Priority::Importante => "Importante",
            Priority::Urgente => "Urgente",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Normal" => Some(Priority::Normal),
            "Importante" => Some(Priority::Importante),
            "Urgente" => Some(Priority::Urgente),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub author_id: i64,
    pub author_name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationCreate {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub priority: Priority,
}
