//! Order notification pipeline
//!
//! Single entry point for turning a one-time payment token into delivered
//! Telegram messages. Both the server-side flow driver and the external
//! `/api/telegram` endpoint go through here, so the one-time token guard
//! covers them uniformly.

use crate::shared::error::AppResult;
use std::sync::Arc;
use tracing::info;

use super::dispatcher::{DispatchReport, DispatcherService};
use super::payment_token::PaymentTokenService;

/// Notification service gating dispatch on a one-time payment token
pub struct NotificationService {
    tokens: Arc<PaymentTokenService>,
    dispatcher: Arc<DispatcherService>,
}

impl NotificationService {
    pub fn new(tokens: Arc<PaymentTokenService>, dispatcher: Arc<DispatcherService>) -> Self {
        Self { tokens, dispatcher }
    }

    /// Resolve the token to order data (consuming it) and dispatch to both
    /// channels.
    pub async fn notify_with_token(&self, token: &str) -> AppResult<DispatchReport> {
        let order = self.tokens.validate(token)?;
        info!(
            transaction_id = %order.transaction_id,
            "dispatching order notification"
        );
        Ok(self.dispatcher.notify_order(&order).await)
    }
}
