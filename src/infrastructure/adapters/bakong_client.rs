//! Bakong transaction-status adapter
//!
//! Looks up payment status by md5 correlation key. The typed `check` path
//! folds every transport problem into `PollOutcome::TransportError` so the
//! flow state machine stays the single place deciding what failures mean;
//! `relay` forwards a raw body for the `/api/verify-payment` proxy endpoint.

use crate::application::services::flow::PaymentStatusClient;
use crate::config::AppConfig;
use crate::domain::flow::PollOutcome;
use crate::shared::error::{AppError, AppResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Adapter for the Bakong check_transaction_by_md5 API
pub struct BakongStatusAdapter {
    config: Arc<AppConfig>,
    client: reqwest::Client,
}

impl BakongStatusAdapter {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Forward a raw request body to the status API and return its status
    /// and parsed JSON body, for the stateless proxy endpoint.
    pub async fn relay(&self, body: Bytes) -> AppResult<(u16, serde_json::Value)> {
        let response = self
            .client
            .post(&self.config.upstream.bakong_url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.config.upstream.bakong_api_token)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Bakong request failed: {}", e)))?;

        let status = response.status().as_u16();
        let value = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AppError::Upstream(format!("Bakong response parse failed: {}", e)))?;
        Ok((status, value))
    }
}

#[async_trait]
impl PaymentStatusClient for BakongStatusAdapter {
    async fn check(&self, md5: &str) -> PollOutcome {
        let response = match self
            .client
            .post(&self.config.upstream.bakong_url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.config.upstream.bakong_api_token)
            .json(&json!({ "md5": md5 }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "payment status request failed");
                return PollOutcome::TransportError;
            }
        };

        match response.json::<serde_json::Value>().await {
            Ok(value) => match value.get("responseCode").and_then(|c| c.as_i64()) {
                Some(code) => PollOutcome::from_response_code(code),
                None => {
                    warn!("payment status response missing responseCode");
                    PollOutcome::TransportError
                }
            },
            Err(e) => {
                warn!(error = %e, "payment status response parse failed");
                PollOutcome::TransportError
            }
        }
    }
}
