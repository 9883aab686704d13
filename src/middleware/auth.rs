use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::middleware::identity::RequestIdentity;
use crate::modules::auth::model::Claims;
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;

/// Extractor for handlers that require an authenticated caller.
///
/// Reads the identity the [`resolve_identity`] middleware attached; a
/// guest (no token, or a token that failed verification) is rejected with
/// 401 here, after admission control has already run.
///
/// [`resolve_identity`]: crate::middleware::identity::resolve_identity
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid user ID in token")))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn role(&self) -> Option<UserRole> {
        UserRole::parse(&self.0.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(UserRole::Admin)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .and_then(|identity| identity.claims.clone())
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Authentication required")))
    }
}
