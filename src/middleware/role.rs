//! Role-based route guards.
//!
//! Extractor-based checks built on [`AuthUser`]: a handler parameter of
//! type [`RequireAdmin`] or [`RequireTeacher`] rejects callers below the
//! required role before the handler body runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;

fn role_level(role: UserRole) -> u8 {
    match role {
        UserRole::Admin => 2,
        UserRole::Teacher => 1,
        UserRole::Student => 0,
    }
}

fn require_at_least(user: &AuthUser, minimum: UserRole) -> Result<(), AppError> {
    let role = user.role().ok_or_else(|| {
        AppError::forbidden(anyhow::anyhow!("Access denied. Unrecognized role."))
    })?;

    if role_level(role) < role_level(minimum) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. {:?} privileges required.",
            minimum
        )));
    }

    Ok(())
}

/// Admin-only access.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_at_least(&user, UserRole::Admin)?;
        Ok(RequireAdmin(user))
    }
}

/// Teacher-or-admin access.
#[derive(Debug, Clone)]
pub struct RequireTeacher(pub AuthUser);

impl<S> FromRequestParts<S> for RequireTeacher
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_at_least(&user, UserRole::Teacher)?;
        Ok(RequireTeacher(user))
    }
}
