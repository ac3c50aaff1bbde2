//! Internal Chat Model

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANNEL: &str = "general";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub channel: String,
    pub author_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageCreate {
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatQuery {
    pub limit: Option<i64>,
    /// Only messages strictly older than this timestamp
    pub before: Option<i64>,
}
