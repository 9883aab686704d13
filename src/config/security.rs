//! Admission-control configuration.
//!
//! Loaded once at startup and carried (immutably) in the application state;
//! nothing in the admission layer reads the environment per request.
//!
//! # Environment Variables
//!
//! - `APP_ENV`: `production`, `development` (default) or `test`
//! - `RATE_LIMIT_ADMIN`: requests per minute for admins (default 20 prod / 300 otherwise)
//! - `RATE_LIMIT_USER`: requests per minute for teachers and students (10 / 120)
//! - `RATE_LIMIT_GUEST`: requests per minute for unauthenticated callers (5 / 60)
//! - `RATE_LIMIT_SUBJECTS_GET`: higher cap for `GET /api/subjects` (30 / 240)
//! - `BYPASS_RATE_LIMIT`: `true` disables admission checks outside production
//! - `GUARD_URL` / `GUARD_API_KEY`: protection decision service endpoint

use std::env;

/// Deployment environment the process runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Test,
}

impl Environment {
    pub fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") => Environment::Production,
            Ok("test") => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// A per-path ceiling that can raise (never lower) the role-based limit
/// for `GET` requests whose path starts with `prefix`.
#[derive(Clone, Debug)]
pub struct PathOverride {
    pub prefix: String,
    pub ceiling: u32,
}

/// Rate limit and protection configuration for the admission layer.
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    pub environment: Environment,
    /// Requests per minute for the admin role.
    pub admin_ceiling: u32,
    /// Requests per minute for teachers and students (shared tier).
    pub user_ceiling: u32,
    /// Requests per minute for unauthenticated callers.
    pub guest_ceiling: u32,
    /// Raise-only overrides applied to GET requests by path prefix.
    pub path_overrides: Vec<PathOverride>,
    /// Development-only escape hatch; ignored in production.
    pub bypass_rate_limit: bool,
    /// Base URL of the protection decision service.
    pub guard_url: String,
    pub guard_api_key: String,
}

/// A ceiling is a positive integer or the default: absent, non-numeric and
/// non-positive values all fall back. A misconfigured ceiling must never
/// become zero ("always denied") or unlimited.
fn parse_ceiling(value: Option<String>, default: u32) -> u32 {
    match value.and_then(|v| v.parse::<u32>().ok()) {
        Some(n) if n > 0 => n,
        _ => default,
    }
}

fn env_ceiling(name: &str, default: u32) -> u32 {
    parse_ceiling(env::var(name).ok(), default)
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        Self::from_env_for(Environment::from_env())
    }

    pub fn from_env_for(environment: Environment) -> Self {
        let production = environment.is_production();
        let subjects_get =
            env_ceiling("RATE_LIMIT_SUBJECTS_GET", if production { 30 } else { 240 });

        Self {
            environment,
            admin_ceiling: env_ceiling("RATE_LIMIT_ADMIN", if production { 20 } else { 300 }),
            user_ceiling: env_ceiling("RATE_LIMIT_USER", if production { 10 } else { 120 }),
            guest_ceiling: env_ceiling("RATE_LIMIT_GUEST", if production { 5 } else { 60 }),
            path_overrides: vec![PathOverride {
                prefix: "/api/subjects".to_string(),
                ceiling: subjects_get,
            }],
            bypass_rate_limit: env::var("BYPASS_RATE_LIMIT")
                .map(|v| v == "true")
                .unwrap_or(false),
            guard_url: env::var("GUARD_URL")
                .unwrap_or_else(|_| "http://localhost:8700".to_string()),
            guard_api_key: env::var("GUARD_API_KEY").unwrap_or_default(),
        }
    }

    /// Whether admission control is skipped entirely for this process.
    ///
    /// The test environment always bypasses; the explicit bypass flag only
    /// works outside production.
    pub fn admission_bypassed(&self) -> bool {
        self.environment == Environment::Test
            || (self.bypass_rate_limit && !self.environment.is_production())
    }
}
