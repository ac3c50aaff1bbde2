//! LiveHub: change-feed fan-out
//!
//! Services publish a [`LiveEvent`] after each committed write; every
//! WebSocket session holds a broadcast receiver and filters by its topics and
//! area before forwarding.
//!
//! ```text
//! services (orders, fuel, notifications, chat, security)
//!       │ LiveEvent
//!       ▼
//! LiveHub ── broadcast::Sender<LiveEvent>
//!       │
//!       ▼
//! WS sessions (subscribe → filter → push)
//! ```

use dashmap::DashMap;
use shared::live::{LiveEvent, Topic};
use shared::models::Area;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Broadcast channel capacity
const BROADCAST_CAPACITY: usize = 256;

/// Maximum concurrent live connections per user
pub const MAX_CONNECTIONS_PER_USER: usize = 5;

#[derive(Clone)]
pub struct LiveHub {
    tx: broadcast::Sender<LiveEvent>,
    /// user_id → open WebSocket sessions
    connections: Arc<DashMap<i64, AtomicUsize>>,
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            connections: Arc::new(DashMap::new()),
        }
    }

    /// Broadcast an event (no subscribers is not an error)
    pub fn publish(&self, event: LiveEvent) {
        let topic = event.topic();
        if let Ok(receivers) = self.tx.send(event) {
            tracing::trace!(topic = topic.as_str(), receivers, "Live event published");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Reserve a connection slot for `user_id`; the slot is released when the
    /// guard drops.
    pub fn try_acquire(&self, user_id: i64) -> Result<ConnectionGuard, usize> {
        let counter = self
            .connections
            .entry(user_id)
            .or_insert_with(|| AtomicUsize::new(0));
        let prev = counter.fetch_add(1, Ordering::SeqCst);
        if prev >= MAX_CONNECTIONS_PER_USER {
            counter.fetch_sub(1, Ordering::SeqCst);
            return Err(prev);
        }
        drop(counter);
        Ok(ConnectionGuard {
            user_id,
            connections: self.connections.clone(),
        })
    }

    pub fn connection_count(&self, user_id: i64) -> usize {
        self.connections
            .get(&user_id)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

/// Open live session slot
pub struct ConnectionGuard {
    user_id: i64,
    connections: Arc<DashMap<i64, AtomicUsize>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(counter) = self.connections.get(&self.user_id) {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Per-session subscription filter
#[derive(Debug, Clone)]
pub struct Subscription {
    pub topics: Vec<Topic>,
    /// Area whose notifications and orders are delivered; `None` receives all (admins)
    pub area: Option<Area>,
}

impl Subscription {
    pub fn accepts(&self, event: &LiveEvent) -> bool {
        self.topics.contains(&event.topic()) && event.visible_to(self.area)
    }
}
