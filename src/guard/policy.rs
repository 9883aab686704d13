//! Rate-limit policy resolution.
//!
//! A policy is a pure value computed per request from the resolved role,
//! the request method/path and the process configuration. Nothing here
//! performs I/O; the external decision service enforces the result.

use axum::http::Method;

use crate::config::security::SecurityConfig;
use crate::modules::users::model::UserRole;

/// The role a request is admitted under.
///
/// Unlike [`UserRole`] this includes `Guest`: the admission layer must
/// produce a policy for every request, authenticated or not, and any
/// unrecognised role string from the identity layer collapses to `Guest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestRole {
    Guest,
    Student,
    Teacher,
    Admin,
}

impl RequestRole {
    /// Normalise a provider role string. Anything outside the closed set
    /// is treated as a guest rather than an error.
    pub fn from_provider(role: &str) -> Self {
        match role {
            "admin" => RequestRole::Admin,
            "teacher" => RequestRole::Teacher,
            "student" => RequestRole::Student,
            _ => RequestRole::Guest,
        }
    }
}

impl From<UserRole> for RequestRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => RequestRole::Admin,
            UserRole::Teacher => RequestRole::Teacher,
            UserRole::Student => RequestRole::Student,
        }
    }
}

/// The effective rate-limit policy for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Sliding window size. Fixed at one minute.
    pub window_secs: u64,
    /// Maximum requests per window. Always positive.
    pub ceiling: u32,
    /// Message returned to the caller when the ceiling is exceeded.
    pub exceeded_message: String,
}

/// Compute the policy for a request.
///
/// The role picks a base ceiling; a configured path override can raise
/// (never lower) it for GET requests on matching prefixes.
pub fn resolve_policy(
    role: RequestRole,
    method: &Method,
    path: &str,
    config: &SecurityConfig,
) -> RateLimitPolicy {
    let base = match role {
        RequestRole::Admin => config.admin_ceiling,
        RequestRole::Teacher | RequestRole::Student => config.user_ceiling,
        RequestRole::Guest => config.guest_ceiling,
    };

    let mut ceiling = base;
    if method == Method::GET {
        for over in &config.path_overrides {
            if path.starts_with(&over.prefix) {
                ceiling = ceiling.max(over.ceiling);
            }
        }
    }

    let exceeded_message = match role {
        RequestRole::Admin => format!(
            "Admin request limit exceeded ({ceiling} per minute). Slow down!"
        ),
        RequestRole::Teacher | RequestRole::Student => format!(
            "User request limit exceeded ({ceiling} per minute). Please wait."
        ),
        RequestRole::Guest => format!(
            "Guest request limit exceeded ({ceiling} per minute). Please sign up for higher limits."
        ),
    };

    RateLimitPolicy {
        window_secs: 60,
        ceiling,
        exceeded_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::security::{Environment, PathOverride};

    fn production_defaults() -> SecurityConfig {
        SecurityConfig {
            environment: Environment::Production,
            admin_ceiling: 20,
            user_ceiling: 10,
            guest_ceiling: 5,
            path_overrides: vec![PathOverride {
                prefix: "/api/subjects".to_string(),
                ceiling: 30,
            }],
            bypass_rate_limit: false,
            guard_url: "http://localhost:8700".to_string(),
            guard_api_key: String::new(),
        }
    }

    #[test]
    fn test_ceilings_positive_and_ordered() {
        let config = production_defaults();
        let roles = [
            RequestRole::Guest,
            RequestRole::Student,
            RequestRole::Teacher,
            RequestRole::Admin,
        ];

        for role in roles {
            let policy = resolve_policy(role, &Method::POST, "/api/classes", &config);
            assert!(policy.ceiling > 0, "{role:?} ceiling must be positive");
            assert_eq!(policy.window_secs, 60);
        }

        let admin = resolve_policy(RequestRole::Admin, &Method::POST, "/api/classes", &config);
        let teacher = resolve_policy(RequestRole::Teacher, &Method::POST, "/api/classes", &config);
        let student = resolve_policy(RequestRole::Student, &Method::POST, "/api/classes", &config);
        let guest = resolve_policy(RequestRole::Guest, &Method::POST, "/api/classes", &config);

        assert_eq!(teacher.ceiling, student.ceiling);
        assert!(admin.ceiling >= teacher.ceiling);
        assert!(teacher.ceiling >= guest.ceiling);
    }

    #[test]
    fn test_subjects_get_takes_max_of_role_and_override() {
        let config = production_defaults();

        // Guest base 5, override 30 -> 30.
        let guest = resolve_policy(RequestRole::Guest, &Method::GET, "/api/subjects", &config);
        assert_eq!(guest.ceiling, 30);

        // Override applies to sub-paths of the prefix too.
        let nested = resolve_policy(
            RequestRole::Guest,
            &Method::GET,
            "/api/subjects/3f6c2e8a",
            &config,
        );
        assert_eq!(nested.ceiling, 30);
    }

    #[test]
    fn test_override_never_lowers() {
        let mut config = production_defaults();
        config.admin_ceiling = 100;

        let admin = resolve_policy(RequestRole::Admin, &Method::GET, "/api/subjects", &config);
        assert_eq!(admin.ceiling, 100);
    }

    #[test]
    fn test_override_inert_for_other_methods_and_paths() {
        let config = production_defaults();

        let post = resolve_policy(RequestRole::Guest, &Method::POST, "/api/subjects", &config);
        assert_eq!(post.ceiling, 5);

        let other = resolve_policy(RequestRole::Guest, &Method::GET, "/api/departments", &config);
        assert_eq!(other.ceiling, 5);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let config = production_defaults();
        let a = resolve_policy(RequestRole::Teacher, &Method::GET, "/api/subjects", &config);
        let b = resolve_policy(RequestRole::Teacher, &Method::GET, "/api/subjects", &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_message_names_tier_and_ceiling() {
        let config = production_defaults();

        let admin = resolve_policy(RequestRole::Admin, &Method::POST, "/api/users", &config);
        assert_eq!(
            admin.exceeded_message,
            "Admin request limit exceeded (20 per minute). Slow down!"
        );

        let student = resolve_policy(RequestRole::Student, &Method::POST, "/api/users", &config);
        assert_eq!(
            student.exceeded_message,
            "User request limit exceeded (10 per minute). Please wait."
        );

        let guest = resolve_policy(RequestRole::Guest, &Method::POST, "/api/users", &config);
        assert_eq!(
            guest.exceeded_message,
            "Guest request limit exceeded (5 per minute). Please sign up for higher limits."
        );
    }

    #[test]
    fn test_unknown_role_string_resolves_to_guest() {
        assert_eq!(RequestRole::from_provider("admin"), RequestRole::Admin);
        assert_eq!(RequestRole::from_provider("teacher"), RequestRole::Teacher);
        assert_eq!(RequestRole::from_provider("student"), RequestRole::Student);
        assert_eq!(RequestRole::from_provider("superuser"), RequestRole::Guest);
        assert_eq!(RequestRole::from_provider(""), RequestRole::Guest);
    }
}
