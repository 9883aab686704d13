//! Admission-control middleware.
//!
//! The last gate before route handlers: resolves the rate-limit policy for
//! the request's identity, asks the protection decision service for a
//! verdict and either forwards the request untouched or terminates the
//! exchange with the matching denial response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::config::security::SecurityConfig;
use crate::guard::decision::{
    AdmissionOutcome, DecisionService, RequestDescriptor, evaluate,
};
use crate::guard::policy::{RequestRole, resolve_policy};
use crate::middleware::identity::RequestIdentity;

/// Everything the admission middleware needs, bundled so tests can build
/// it with a fake decision service and no database.
#[derive(Clone)]
pub struct GuardState {
    pub config: Arc<SecurityConfig>,
    pub decision: Arc<dyn DecisionService>,
}

impl GuardState {
    pub fn new(config: SecurityConfig, decision: Arc<dyn DecisionService>) -> Self {
        Self {
            config: Arc::new(config),
            decision,
        }
    }
}

pub async fn admission_middleware(
    State(guard): State<GuardState>,
    req: Request,
    next: Next,
) -> Response {
    // Total short-circuit: in the test environment, or with the
    // development bypass active, the pipeline never runs.
    if guard.config.admission_bypassed() {
        return next.run(req).await;
    }

    let role = req
        .extensions()
        .get::<RequestIdentity>()
        .map(|identity| identity.role)
        .unwrap_or(RequestRole::Guest);

    let policy = resolve_policy(role, req.method(), req.uri().path(), &guard.config);
    let descriptor = RequestDescriptor::new(
        req.method(),
        &req.uri().to_string(),
        client_ip(&req),
        req.headers(),
    );

    match evaluate(guard.decision.as_ref(), &policy, &descriptor).await {
        AdmissionOutcome::Allowed => next.run(req).await,
        outcome => {
            tracing::warn!(
                ?role,
                method = %descriptor.method,
                url = %descriptor.url,
                ip = %descriptor.ip,
                ?outcome,
                "request denied"
            );
            denial_response(outcome)
        }
    }
}

fn denial_response(outcome: AdmissionOutcome) -> Response {
    let (status, message) = match outcome {
        AdmissionOutcome::DeniedBot => (
            StatusCode::FORBIDDEN,
            "Automated requests are not allowed".to_string(),
        ),
        AdmissionOutcome::DeniedShield => (
            StatusCode::FORBIDDEN,
            "Request blocked by security policy".to_string(),
        ),
        AdmissionOutcome::DeniedRateLimit(message) => (StatusCode::TOO_MANY_REQUESTS, message),
        AdmissionOutcome::EvaluationError | AdmissionOutcome::Allowed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong while evaluating the request.".to_string(),
        ),
    };

    let body = Json(json!({
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": message,
    }));

    (status, body).into_response()
}

/// Client address used as the rate-limit fingerprint: first hop of
/// `x-forwarded-for` when present, else the socket peer address.
fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "0.0.0.0".to_string())
}
