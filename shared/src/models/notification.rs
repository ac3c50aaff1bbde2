//! Notification Model
//!
//! Rows are created by workflow handlers and only ever mutated to flip the
//! `read` flag.

use serde::{Deserialize, Serialize};

use super::area::Recipient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient: Recipient,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: i64,
}

/// Insert payload used by the workflow services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationCreate {
    pub recipient: Recipient,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
}

impl NotificationCreate {
    pub fn new(
        recipient: impl Into<Recipient>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            title: title.into(),
            description: description.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}
