//! HTTP implementation of the remote gateway.
//!
//! Maps the gateway trait onto the exchange backend's REST endpoints.
//! Any non-2xx response surfaces its body text verbatim to the caller.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::RemoteGateway;
use async_trait::async_trait;
use cdk_types::{CodeInfo, Identity, RedemptionOutcome, TaskHandle, TaskStatus};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL for the exchange API (e.g. `https://api.cdk.example.com`).
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.cdk.example.com".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Serialize)]
struct VerifyIdentityBody<'a> {
    token: &'a str,
    code: &'a str,
    context: &'a str,
}

#[derive(Serialize)]
struct SubmitRedeemBody<'a> {
    code: &'a str,
    token: &'a str,
}

#[derive(Deserialize)]
struct SubmitRedeemResponse {
    task_id: Option<String>,
}

/// Gateway backed by the exchange REST API.
pub struct HttpGateway {
    config: GatewayConfig,
    client: Client,
}

impl HttpGateway {
    /// Creates a gateway from config.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self { config, client }
    }

    /// Returns the body of a 2xx response, or the error body verbatim.
    async fn read_ok(response: Response) -> GatewayResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            debug!(%status, "gateway call failed");
            Err(GatewayError::Network(body))
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(body: &str) -> GatewayResult<T> {
        serde_json::from_str(body)
            .map_err(|e| GatewayError::Protocol(format!("unexpected response: {e}")))
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn verify_code(&self, code: &str, context: &str) -> GatewayResult<CodeInfo> {
        let url = format!("{}/verify-code/{code}", self.config.api_base_url);
        debug!(code, context, "verifying code");
        let response = self
            .client
            .get(url)
            .query(&[("context", context)])
            .send()
            .await?;
        let body = Self::read_ok(response).await?;
        Self::parse(&body)
    }

    async fn verify_identity(
        &self,
        token: &str,
        code: &str,
        context: &str,
    ) -> GatewayResult<Identity> {
        let url = format!("{}/verify-identity", self.config.api_base_url);
        debug!(context, "verifying identity");
        let response = self
            .client
            .post(url)
            .json(&VerifyIdentityBody {
                token,
                code,
                context,
            })
            .send()
            .await?;
        let body = Self::read_ok(response).await?;
        Self::parse(&body)
    }

    async fn submit_redeem(&self, code: &str, token: &str) -> GatewayResult<RedemptionOutcome> {
        let url = format!("{}/submit-redeem", self.config.api_base_url);
        debug!(code, "submitting redemption");
        let response = self
            .client
            .post(url)
            .json(&SubmitRedeemBody { code, token })
            .send()
            .await?;
        let body = Self::read_ok(response).await?;

        // Backends vary: a bare 200 (empty body or `true`) means the
        // redemption completed synchronously; a JSON object with `task_id`
        // means an asynchronous task was queued.
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "true" {
            return Ok(RedemptionOutcome::Success { receipt: None });
        }
        let parsed: SubmitRedeemResponse = Self::parse(trimmed)?;
        match parsed.task_id {
            Some(id) => Ok(RedemptionOutcome::Pending(TaskHandle::new(id))),
            None => Ok(RedemptionOutcome::Success { receipt: None }),
        }
    }

    async fn poll_task(&self, handle: &TaskHandle) -> GatewayResult<TaskStatus> {
        let url = format!("{}/task/{}", self.config.api_base_url, handle.id);
        let response = self.client.get(url).send().await?;
        let body = Self::read_ok(response).await?;
        Self::parse(&body)
    }
}
