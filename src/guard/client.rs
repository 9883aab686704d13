//! HTTP client for the protection decision service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::security::SecurityConfig;
use crate::guard::decision::{DecisionService, RequestDescriptor, Verdict};
use crate::guard::policy::RateLimitPolicy;

/// Outbound decision client. One instance per process; the underlying
/// `reqwest::Client` pools connections and is safe to share across
/// concurrent in-flight requests.
#[derive(Clone, Debug)]
pub struct HttpDecisionService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct DecideRule<'a> {
    mode: &'a str,
    window_secs: u64,
    max: u32,
}

#[derive(Serialize)]
struct DecideBody<'a> {
    rule: DecideRule<'a>,
    request: &'a RequestDescriptor,
}

#[derive(Deserialize)]
struct DecideReason {
    #[serde(default)]
    bot: bool,
    #[serde(default)]
    shield: bool,
    #[serde(default)]
    rate_limit: bool,
}

#[derive(Deserialize)]
struct DecideResponse {
    conclusion: String,
    #[serde(default)]
    reason: Option<DecideReason>,
}

impl HttpDecisionService {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.guard_url.trim_end_matches('/').to_string(),
            api_key: config.guard_api_key.clone(),
        }
    }
}

#[async_trait]
impl DecisionService for HttpDecisionService {
    async fn check(
        &self,
        policy: &RateLimitPolicy,
        request: &RequestDescriptor,
    ) -> anyhow::Result<Verdict> {
        let body = DecideBody {
            rule: DecideRule {
                mode: "LIVE",
                window_secs: policy.window_secs,
                max: policy.ceiling,
            },
            request,
        };

        let response = self
            .http
            .post(format!("{}/v1/decide", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<DecideResponse>()
            .await?;

        let denied = match response.conclusion.as_str() {
            "allow" => false,
            "deny" => true,
            other => anyhow::bail!("unexpected conclusion from decision service: {other:?}"),
        };
        let reason = response.reason.unwrap_or(DecideReason {
            bot: false,
            shield: false,
            rate_limit: false,
        });

        Ok(Verdict {
            denied,
            bot: reason.bot,
            shield: reason.shield,
            rate_limited: reason.rate_limit,
        })
    }
}
