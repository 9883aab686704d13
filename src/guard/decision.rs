//! Protection verdicts and their classification.
//!
//! The decision service is a black box: it receives the resolved policy
//! plus a request fingerprint and returns a [`Verdict`]. This module owns
//! the translation of that verdict into the one [`AdmissionOutcome`] the
//! pipeline acts on. A failed call is an outcome of its own — the gate
//! fails closed, never open.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Serialize;

use crate::guard::policy::RateLimitPolicy;

/// Request fingerprint forwarded to the decision service.
#[derive(Clone, Debug, Serialize)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub ip: String,
    pub headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// Build a descriptor from request parts. Credential-bearing headers
    /// are stripped before anything leaves the process.
    pub fn new(method: &axum::http::Method, url: &str, ip: String, headers: &HeaderMap) -> Self {
        let headers = headers
            .iter()
            .filter(|(name, _)| {
                !matches!(
                    name.as_str(),
                    "authorization" | "proxy-authorization" | "cookie"
                )
            })
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            method: method.to_string(),
            url: url.to_string(),
            ip,
            headers,
        }
    }
}

/// Raw verdict from the decision service: an overall conclusion plus the
/// independent denial classifications it was reached from.
#[derive(Clone, Copy, Debug, Default)]
pub struct Verdict {
    pub denied: bool,
    pub bot: bool,
    pub shield: bool,
    pub rate_limited: bool,
}

/// Seam between the admission pipeline and the external protection
/// service. Object-safe so tests can substitute a fake.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn check(
        &self,
        policy: &RateLimitPolicy,
        request: &RequestDescriptor,
    ) -> anyhow::Result<Verdict>;
}

/// What the pipeline does with a request. Exactly one variant per request,
/// fully determining the HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Allowed,
    DeniedBot,
    DeniedShield,
    DeniedRateLimit(String),
    EvaluationError,
}

impl AdmissionOutcome {
    /// Classify a verdict. Denial reasons are checked in priority order:
    /// bot, then shield, then rate limit.
    pub fn classify(verdict: Verdict, policy: &RateLimitPolicy) -> Self {
        if verdict.denied && verdict.bot {
            return AdmissionOutcome::DeniedBot;
        }
        if verdict.denied && verdict.shield {
            return AdmissionOutcome::DeniedShield;
        }
        if verdict.denied && verdict.rate_limited {
            return AdmissionOutcome::DeniedRateLimit(policy.exceeded_message.clone());
        }
        AdmissionOutcome::Allowed
    }
}

/// Run one protection check and classify the result.
///
/// Service faults are not retried here; they surface as
/// [`AdmissionOutcome::EvaluationError`] and no partial verdict is used.
pub async fn evaluate(
    service: &dyn DecisionService,
    policy: &RateLimitPolicy,
    request: &RequestDescriptor,
) -> AdmissionOutcome {
    match service.check(policy, request).await {
        Ok(verdict) => AdmissionOutcome::classify(verdict, policy),
        Err(err) => {
            tracing::error!(error = ?err, "protection decision check failed");
            AdmissionOutcome::EvaluationError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy {
            window_secs: 60,
            ceiling: 10,
            exceeded_message: "User request limit exceeded (10 per minute). Please wait."
                .to_string(),
        }
    }

    struct FixedVerdict(Verdict);

    #[async_trait]
    impl DecisionService for FixedVerdict {
        async fn check(
            &self,
            _policy: &RateLimitPolicy,
            _request: &RequestDescriptor,
        ) -> anyhow::Result<Verdict> {
            Ok(self.0)
        }
    }

    struct FailingService;

    #[async_trait]
    impl DecisionService for FailingService {
        async fn check(
            &self,
            _policy: &RateLimitPolicy,
            _request: &RequestDescriptor,
        ) -> anyhow::Result<Verdict> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor {
            method: "GET".to_string(),
            url: "/api/subjects".to_string(),
            ip: "10.0.0.1".to_string(),
            headers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_bot_takes_priority_over_everything() {
        let verdict = Verdict {
            denied: true,
            bot: true,
            shield: true,
            rate_limited: true,
        };
        assert_eq!(
            AdmissionOutcome::classify(verdict, &policy()),
            AdmissionOutcome::DeniedBot
        );
    }

    #[test]
    fn test_shield_before_rate_limit() {
        let verdict = Verdict {
            denied: true,
            bot: false,
            shield: true,
            rate_limited: true,
        };
        assert_eq!(
            AdmissionOutcome::classify(verdict, &policy()),
            AdmissionOutcome::DeniedShield
        );
    }

    #[test]
    fn test_rate_limit_carries_tier_message() {
        let verdict = Verdict {
            denied: true,
            rate_limited: true,
            ..Default::default()
        };
        let outcome = AdmissionOutcome::classify(verdict, &policy());
        assert_eq!(
            outcome,
            AdmissionOutcome::DeniedRateLimit(
                "User request limit exceeded (10 per minute). Please wait.".to_string()
            )
        );
    }

    #[test]
    fn test_flags_without_overall_deny_are_ignored() {
        let verdict = Verdict {
            denied: false,
            bot: true,
            ..Default::default()
        };
        assert_eq!(
            AdmissionOutcome::classify(verdict, &policy()),
            AdmissionOutcome::Allowed
        );
    }

    #[tokio::test]
    async fn test_service_fault_fails_closed() {
        let outcome = evaluate(&FailingService, &policy(), &descriptor()).await;
        assert_eq!(outcome, AdmissionOutcome::EvaluationError);
    }

    #[tokio::test]
    async fn test_clean_verdict_is_allowed() {
        let service = FixedVerdict(Verdict::default());
        let outcome = evaluate(&service, &policy(), &descriptor()).await;
        assert_eq!(outcome, AdmissionOutcome::Allowed);
    }

    #[test]
    fn test_descriptor_strips_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer secret".parse().unwrap());
        headers.insert("cookie", "session=abc".parse().unwrap());
        headers.insert("user-agent", "curl/8.0".parse().unwrap());

        let descriptor = RequestDescriptor::new(
            &axum::http::Method::GET,
            "/api/subjects",
            "10.0.0.1".to_string(),
            &headers,
        );

        assert!(!descriptor.headers.contains_key("authorization"));
        assert!(!descriptor.headers.contains_key("cookie"));
        assert_eq!(
            descriptor.headers.get("user-agent").map(String::as_str),
            Some("curl/8.0")
        );
    }
}
