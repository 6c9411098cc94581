//! Telegram Bot API adapter

use crate::application::services::dispatcher::MessageSender;
use crate::config::AppConfig;
use crate::shared::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    ok: bool,
    description: Option<String>,
}

/// Adapter for the Telegram Bot sendMessage API
pub struct TelegramApiAdapter {
    config: Arc<AppConfig>,
    client: reqwest::Client,
}

impl TelegramApiAdapter {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.telegram.api_base, self.config.telegram.bot_token
        )
    }
}

#[async_trait]
impl MessageSender for TelegramApiAdapter {
    async fn send(&self, chat_id: &str, text: &str) -> AppResult<()> {
        let response = self
            .client
            .post(self.send_message_url())
            .header("Content-Type", "application/json")
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_notification": false,
            }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Telegram request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .json::<SendMessageResponse>()
            .await
            .map_err(|e| AppError::Upstream(format!("Telegram response parse failed: {}", e)))?;

        if !status.is_success() || !body.ok {
            return Err(AppError::Upstream(
                body.description
                    .unwrap_or_else(|| "Failed to send message".to_string()),
            ));
        }

        Ok(())
    }
}
