//! Identity resolution middleware.
//!
//! Runs before admission control and attaches a [`RequestIdentity`] to
//! every request. Resolution never rejects: a missing, invalid or expired
//! token, or a role string outside the known set, resolves to the guest
//! identity and the request continues. Route-level guards decide later
//! whether a guest may reach a handler.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::config::jwt::JwtConfig;
use crate::guard::policy::RequestRole;
use crate::modules::auth::model::Claims;
use crate::utils::jwt::verify_token;

/// The identity a request was admitted under, available from request
/// extensions to the admission layer and to handlers.
#[derive(Clone, Debug)]
pub struct RequestIdentity {
    pub role: RequestRole,
    pub claims: Option<Claims>,
}

impl RequestIdentity {
    pub fn guest() -> Self {
        Self {
            role: RequestRole::Guest,
            claims: None,
        }
    }
}

pub async fn resolve_identity(
    State(jwt_config): State<JwtConfig>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match bearer_token(&req) {
        Some(token) => match verify_token(token, &jwt_config) {
            Ok(claims) => RequestIdentity {
                role: RequestRole::from_provider(&claims.role),
                claims: Some(claims),
            },
            Err(_) => {
                tracing::warn!("token verification failed, continuing as guest");
                RequestIdentity::guest()
            }
        },
        None => RequestIdentity::guest(),
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
