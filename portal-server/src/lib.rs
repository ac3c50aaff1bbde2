//! portal-server: Agro Norte operations portal backend
//!
//! - Purchase order workflow (request → approve/reject → dispatch)
//! - Inventory with lot-level batches
//! - Fuel ledger with running levels
//! - Notifications and a live change feed over WebSocket
//! - Security log, registered vehicles, users, gallery, communications, chat

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod logger;
pub mod policy;
pub mod services;
pub mod state;
pub mod util;
pub mod validation;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
