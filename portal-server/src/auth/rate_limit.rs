//! Per-IP request budgets for the public auth routes
//!
//! Each (route, client IP) pair gets a fixed one-minute window. Budgets come
//! from [`Config`](crate::config::Config). A spent budget answers 429 with a
//! `Retry-After` header.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use shared::error::{AppError, ErrorCode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::state::AppState;

const WINDOW: Duration = Duration::from_secs(60);

/// Public route with its own budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthRoute {
    Login,
    Register,
}

impl AuthRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthRoute::Login => "login",
            AuthRoute::Register => "register",
        }
    }
}

/// Requests allowed per client IP and minute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthLimits {
    pub login_per_minute: u32,
    pub register_per_minute: u32,
}

impl Default for AuthLimits {
    fn default() -> Self {
        Self {
            login_per_minute: 5,
            register_per_minute: 3,
        }
    }
}

impl AuthLimits {
    fn budget(&self, route: AuthRoute) -> u32 {
        match route {
            AuthRoute::Login => self.login_per_minute,
            AuthRoute::Register => self.register_per_minute,
        }
    }
}

struct Window {
    started: Instant,
    used: u32,
}

#[derive(Clone)]
pub struct RateLimiter {
    limits: AuthLimits,
    windows: Arc<DashMap<(AuthRoute, String), Window>>,
}

impl RateLimiter {
    pub fn new(limits: AuthLimits) -> Self {
        Self {
            limits,
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Spend one request of `ip`'s budget on `route`.
    /// `Err` carries the time left until the window resets.
    pub fn hit(&self, route: AuthRoute, ip: &str) -> Result<(), Duration> {
        self.hit_at(route, ip, Instant::now())
    }

    fn hit_at(&self, route: AuthRoute, ip: &str, now: Instant) -> Result<(), Duration> {
        let mut window = self
            .windows
            .entry((route, ip.to_owned()))
            .or_insert(Window {
                started: now,
                used: 0,
            });

        if now.saturating_duration_since(window.started) >= WINDOW {
            window.started = now;
            window.used = 0;
        }
        if window.used >= self.limits.budget(route) {
            return Err(WINDOW.saturating_sub(now.saturating_duration_since(window.started)));
        }
        window.used += 1;
        Ok(())
    }

    /// Forget windows that have already expired
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < WINDOW);
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.windows.len()
    }
}

/// First `X-Forwarded-For` hop (reverse proxy), then the peer address
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(state: &AppState, route: AuthRoute, request: Request, next: Next) -> Response {
    let ip = client_ip(&request);
    match state.rate_limiter.hit(route, &ip) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            let secs = retry_after.as_secs().max(1);
            tracing::warn!(
                route = route.as_str(),
                ip = %ip,
                retry_after = secs,
                "Auth rate limit exceeded"
            );
            let mut response = AppError::with_message(
                ErrorCode::TooManyRequests,
                "Too many attempts, try again later",
            )
            .with_detail("retry_after_secs", secs)
            .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}

/// Budget for `POST /api/auth/login`
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state, AuthRoute::Login, request, next).await
}

/// Budget for `POST /api/auth/register`
pub async fn register_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state, AuthRoute::Register, request, next).await
}
