//! Application state

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::BoxError;
use crate::auth::rate_limit::{AuthLimits, RateLimiter};
use crate::config::Config;
use crate::db::{PgStore, Store};
use crate::live::LiveHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Relational store (PostgreSQL in production)
    pub store: Arc<dyn Store>,
    /// Change-feed fan-out for WebSocket subscribers
    pub live: LiveHub,
    /// JWT secret for session tokens
    pub jwt_secret: String,
    /// Session token lifetime
    pub jwt_expiry_hours: i64,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let mut state = Self::with_store(
            Arc::new(PgStore::new(pool)),
            config.jwt_secret.clone(),
            config.jwt_expiry_hours,
        );
        state.rate_limiter = RateLimiter::new(config.auth_limits);
        Ok(state)
    }

    pub fn with_store(store: Arc<dyn Store>, jwt_secret: String, jwt_expiry_hours: i64) -> Self {
        Self {
            store,
            live: LiveHub::new(),
            jwt_secret,
            jwt_expiry_hours,
            rate_limiter: RateLimiter::new(AuthLimits::default()),
        }
    }

    /// State backed by the in-memory store
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::with_store(
            Arc::new(crate::db::memory::MemoryStore::new()),
            "test-secret".to_string(),
            1,
        )
    }
}
