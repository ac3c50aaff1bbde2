//! PostgreSQL store
//!
//! Enumerations are stored as TEXT (CHECK-constrained in the schema) and
//! decoded through each model's `from_db`. Row structs mirror the columns;
//! `TryFrom<Row>` turns them into shared models.

mod content;
mod fuel;
mod inventory;
mod notification;
mod order;
mod security;
mod settings;
mod user;

use sqlx::PgPool;

use crate::BoxError;

/// Relational store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Decode a TEXT enumeration column
fn decode<T>(value: &str, column: &'static str, parse: fn(&str) -> Option<T>) -> Result<T, BoxError> {
    parse(value).ok_or_else(|| format!("unexpected {column} value: {value}").into())
}

fn decode_opt<T>(
    value: Option<&str>,
    column: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, BoxError> {
    value.map(|v| decode(v, column, parse)).transpose()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
}

/// Upper bound on rows returned by unpaged list queries
const LIST_LIMIT: i64 = 500;
