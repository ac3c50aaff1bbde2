//! Live change-feed protocol
//!
//! Server → Client: [`LiveMessage`]
//! Client → Server: [`LiveCommand`]

use serde::{Deserialize, Serialize};

use crate::models::{Area, ChatMessage, FuelLevel, Notification, Order, SecurityReport};

/// Table a subscriber can follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Notifications,
    Chat,
    Orders,
    Fuel,
    Security,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Notifications,
        Topic::Chat,
        Topic::Orders,
        Topic::Fuel,
        Topic::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Notifications => "notifications",
            Topic::Chat => "chat",
            Topic::Orders => "orders",
            Topic::Fuel => "fuel",
            Topic::Security => "security",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s.trim())
    }

    /// Parse a comma-separated list, ignoring unknown entries.
    /// An empty list means every topic.
    pub fn parse_list(s: &str) -> Vec<Topic> {
        let topics: Vec<Topic> = s.split(',').filter_map(Topic::parse).collect();
        if topics.is_empty() {
            Topic::ALL.to_vec()
        } else {
            topics
        }
    }
}

/// Row insert/update event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum LiveEvent {
    NotificationCreated(Notification),
    NotificationRead { id: i64 },
    ChatPosted(ChatMessage),
    OrderChanged(Box<Order>),
    FuelLevelChanged(FuelLevel),
    ReportChanged(Box<SecurityReport>),
}

impl LiveEvent {
    pub fn topic(&self) -> Topic {
        match self {
            LiveEvent::NotificationCreated(_) | LiveEvent::NotificationRead { .. } => {
                Topic::Notifications
            }
            LiveEvent::ChatPosted(_) => Topic::Chat,
            LiveEvent::OrderChanged(_) => Topic::Orders,
            LiveEvent::FuelLevelChanged(_) => Topic::Fuel,
            LiveEvent::ReportChanged(_) => Topic::Security,
        }
    }

    /// Column predicate: whether a subscriber filtering on `area` should see this event.
    ///
    /// Notifications follow their recipient. Orders reach the requesting area
    /// and Almacén, which fulfils every order. Other events are visible to all
    /// subscribers of their topic.
    pub fn visible_to(&self, area: Option<Area>) -> bool {
        match (self, area) {
            (LiveEvent::NotificationCreated(n), Some(area)) => n.recipient.reaches(area),
            (LiveEvent::OrderChanged(order), Some(area)) => {
                area == Area::Almacen || order.requesting_area == area
            }
            _ => true,
        }
    }
}

/// Server → Client message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LiveMessage {
    /// Subscription established
    Ready { topics: Vec<Topic> },
    /// A row changed
    Event { event: LiveEvent },
    /// Events were dropped; the client should refetch its views
    Resync,
}

/// Client → Server command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LiveCommand {
    /// Replace the current topic subscription (empty = all topics)
    Subscribe { topics: Vec<Topic> },
}
