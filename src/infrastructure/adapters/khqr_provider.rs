//! KHQR provider adapter
//!
//! HTTP client for the external QR generation API. The typed `generate`
//! path serves the flow driver; `relay` forwards a raw body on behalf of the
//! `/api/khqr` proxy endpoint.

use crate::application::services::flow::{QrProvider, QrRequest, QrSession};
use crate::config::AppConfig;
use crate::shared::error::{AppError, AppResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Provider response for a QR generation call
#[derive(Debug, Deserialize)]
struct KhqrApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "qrImage")]
    qr_image: Option<String>,
    md5: Option<String>,
}

/// Adapter for the external KHQR generation API
pub struct KhqrProviderAdapter {
    config: Arc<AppConfig>,
    client: reqwest::Client,
}

impl KhqrProviderAdapter {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Forward a raw request body to the provider and return its status and
    /// parsed JSON body, for the stateless proxy endpoint.
    pub async fn relay(&self, body: Bytes) -> AppResult<(u16, serde_json::Value)> {
        let response = self
            .client
            .post(&self.config.upstream.khqr_url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("KHQR request failed: {}", e)))?;

        let status = response.status().as_u16();
        let value = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AppError::Upstream(format!("KHQR response parse failed: {}", e)))?;
        Ok((status, value))
    }
}

#[async_trait]
impl QrProvider for KhqrProviderAdapter {
    async fn generate(&self, request: &QrRequest) -> AppResult<QrSession> {
        // Transient failures are retried with a linear backoff; a response
        // that parses but violates the contract is not.
        let mut last_error = None;
        for attempt in 0..=self.config.upstream.max_retries {
            match self
                .client
                .post(&self.config.upstream.khqr_url)
                .header("Content-Type", "application/json")
                .json(request)
                .send()
                .await
            {
                Ok(response) => {
                    if response.status().is_success() {
                        match response.json::<KhqrApiResponse>().await {
                            Ok(parsed) => {
                                if let (true, Some(qr_image), Some(md5)) =
                                    (parsed.success, parsed.qr_image, parsed.md5)
                                {
                                    return Ok(QrSession { qr_image, md5 });
                                }
                                return Err(AppError::Upstream(
                                    "invalid response from QR code generator".to_string(),
                                ));
                            }
                            Err(e) => {
                                last_error = Some(format!("Failed to parse response: {}", e));
                            }
                        }
                    } else {
                        last_error = Some(format!("HTTP error: {}", response.status()));
                    }
                }
                Err(e) => {
                    last_error = Some(format!("Request failed: {}", e));
                }
            }

            if attempt < self.config.upstream.max_retries {
                info!(
                    "QR generation failed, retrying... (attempt {}/{})",
                    attempt + 1,
                    self.config.upstream.max_retries + 1
                );
                tokio::time::sleep(Duration::from_millis(100 * (attempt + 1) as u64)).await;
            }
        }

        Err(AppError::Upstream(format!(
            "QR generation failed after {} attempts: {:?}",
            self.config.upstream.max_retries + 1,
            last_error
        )))
    }
}
