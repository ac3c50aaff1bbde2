//! Business operations
//!
//! Every mutating call authorizes through [`crate::policy`], validates input,
//! performs one store call and then publishes the committed change to the
//! live hub. Follow-up notifications are best-effort: a failure is logged and
//! never undoes the write that triggered it.

pub mod chat;
pub mod communications;
pub mod fuel;
pub mod gallery;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod security;
pub mod settings;
pub mod users;
