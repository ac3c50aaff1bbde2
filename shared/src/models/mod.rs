//! Data models
//!
//! Shared between the portal server and its clients (via API).
//! All IDs are `i64` snowflakes except inventory items (SKU) and vehicles (plate).
//! Timestamps are UTC milliseconds.

pub mod area;
pub mod chat;
pub mod communication;
pub mod fuel;
pub mod gallery;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod security;
pub mod settings;
pub mod user;

// Re-exports
pub use area::*;
pub use chat::*;
pub use communication::*;
pub use fuel::*;
pub use gallery::*;
pub use inventory::*;
pub use notification::*;
pub use order::*;
pub use security::*;
pub use settings::*;
pub use user::*;
