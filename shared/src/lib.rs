//! Shared types for the Agro Norte operations portal
//!
//! Wire models, derived-value rules (stock status, order and report status
//! machines, fuel arithmetic), the unified error system and the live
//! change-feed protocol.

pub mod error;
pub mod live;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
