//! Portal server configuration

use crate::BoxError;
use crate::auth::rate_limit::AuthLimits;

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 12;

/// Portal server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Pool size
    pub database_max_connections: u32,
    /// HTTP port (API + live WebSocket)
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for session tokens
    pub jwt_secret: String,
    /// Session token lifetime
    pub jwt_expiry_hours: i64,
    /// Allowed browser origin; unset means any origin
    pub cors_allowed_origin: Option<String>,
    /// Administrator created on first start when the user table is empty
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    /// Per-IP budgets for login and self-registration
    pub auth_limits: AuthLimits,
}

impl Config {
    /// Require a secret value: must be set and non-empty in non-development environments.
    fn require_secret(
        name: &str,
        value: Option<String>,
        environment: &str,
    ) -> Result<String, BoxError> {
        let val = match value {
            Some(v) => v,
            None => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let default_limits = AuthLimits::default();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            http_port: parse_env("HTTP_PORT").unwrap_or(DEFAULT_HTTP_PORT),
            jwt_secret: Self::require_secret(
                "JWT_SECRET",
                std::env::var("JWT_SECRET").ok(),
                &environment,
            )?,
            jwt_expiry_hours: parse_env("JWT_EXPIRY_HOURS").unwrap_or(DEFAULT_JWT_EXPIRY_HOURS),
            cors_allowed_origin: non_empty_env("CORS_ALLOWED_ORIGIN"),
            bootstrap_admin_username: non_empty_env("BOOTSTRAP_ADMIN_USERNAME"),
            bootstrap_admin_password: non_empty_env("BOOTSTRAP_ADMIN_PASSWORD"),
            auth_limits: AuthLimits {
                login_per_minute: parse_env("LOGIN_ATTEMPTS_PER_MINUTE")
                    .unwrap_or(default_limits.login_per_minute),
                register_per_minute: parse_env("REGISTRATIONS_PER_MINUTE")
                    .unwrap_or(default_limits.register_per_minute),
            },
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_falls_back_in_development() {
        let val = Config::require_secret("JWT_SECRET", None, "development").unwrap();
        assert_eq!(val, "dev-JWT_SECRET-not-for-production");
    }

    #[test]
    fn secret_required_outside_development() {
        assert!(Config::require_secret("JWT_SECRET", None, "production").is_err());
        assert!(Config::require_secret("JWT_SECRET", Some(String::new()), "staging").is_err());
        assert_eq!(
            Config::require_secret("JWT_SECRET", Some("s3cret".into()), "production").unwrap(),
            "s3cret"
        );
    }
}
