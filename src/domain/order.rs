//! Order domain models and notification message formatting

use crate::shared::error::{AppError, AppResult};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Supported games
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    Mlbb,
    Freefire,
}

impl Game {
    pub fn as_str(&self) -> &'static str {
        match self {
            Game::Mlbb => "mlbb",
            Game::Freefire => "freefire",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Game::Mlbb => "Mobile Legends",
            Game::Freefire => "Free Fire",
        }
    }
}

impl std::str::FromStr for Game {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mlbb" => Ok(Game::Mlbb),
            "freefire" => Ok(Game::Freefire),
            _ => Err(format!("unsupported game: {}", s)),
        }
    }
}

/// A purchasable product (diamond pack or named item)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub code: Option<String>,
    pub diamonds: Option<u32>,
    pub price: f64,
}

/// One checkout attempt. Read-only after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDescriptor {
    pub game: Game,
    pub user_id: String,
    pub server_id: String,
    pub nickname: Option<String>,
    pub product: Product,
    #[serde(default)]
    pub discount_percent: f64,
}

impl OrderDescriptor {
    /// Final amount after the promo discount, rounded to cents
    pub fn final_amount(&self) -> f64 {
        let discount = (self.product.price * self.discount_percent) / 100.0;
        let amount = self.product.price - discount;
        (amount * 100.0).round() / 100.0
    }

    /// Free Fire has no server selection; the upstream order format uses "0"
    pub fn effective_server_id(&self) -> &str {
        match self.game {
            Game::Freefire => "0",
            Game::Mlbb => &self.server_id,
        }
    }

    /// Human-readable product label for receipts
    pub fn product_label(&self) -> String {
        match self.product.diamonds {
            Some(diamonds) => format!("{} diamond", diamonds),
            None => self.product.name.clone(),
        }
    }

    /// Short order code sent to the operator channel
    pub fn order_code(&self) -> String {
        if let Some(code) = &self.product.code {
            return code.clone();
        }
        if let Some(diamonds) = self.product.diamonds {
            return diamonds.to_string();
        }
        self.product.name.clone()
    }

    /// Key for the per-order QR generation cooldown
    pub fn cooldown_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.game.as_str(),
            self.user_id,
            self.effective_server_id(),
            self.product.name
        )
    }

    /// Validate the player identifiers before any upstream call is made
    pub fn validate(&self) -> AppResult<()> {
        let digits = regex::Regex::new(r"^\d{3,12}$")
            .map_err(|e| AppError::Internal(format!("invalid id pattern: {}", e)))?;

        if !digits.is_match(&self.user_id) {
            return Err(AppError::Validation("invalid user id".to_string()));
        }
        if self.game == Game::Mlbb && !digits.is_match(&self.server_id) {
            return Err(AppError::Validation("invalid server id".to_string()));
        }
        if self.product.name.trim().is_empty() {
            return Err(AppError::Validation("missing product".to_string()));
        }
        if self.final_amount() < 0.01 {
            return Err(AppError::Validation(
                "Amount must be at least 0.01 USD. Please remove the promo code for small purchases."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Resolved order payload carried inside a one-time payment token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub transaction_id: String,
    pub order_id: String,
    pub game: String,
    pub amount: f64,
    pub item: String,
    pub user_id: String,
    pub server_id: String,
    pub order_date: String,
    pub main_message: String,
    pub order_message: String,
}

impl OrderData {
    /// Build the notification payload for a paid order.
    ///
    /// Transaction ids look like `tb483920`; order ids are `S` followed by
    /// the unix timestamp in milliseconds, matching the upstream receipt
    /// format the operators already parse.
    pub fn for_order(order: &OrderDescriptor) -> Self {
        let transaction_id = format!("tb{}", rand::rng().random_range(100000..1000000));
        let now = Utc::now();
        let order_id = format!("S{}", now.timestamp_millis());
        let order_date = now.format("%m/%d/%Y, %H:%M:%S").to_string();
        let amount = order.final_amount();

        let main_message = format!(
            "{} {} {}",
            order.user_id,
            order.effective_server_id(),
            order.order_code()
        );

        let order_message = format!(
            "Top up successful✅\n\n\
             -Transaction: {}\n\
             -Game: {}\n\
             -Amount: {} $\n\
             -Item: {}\n\
             -User ID: {}\n\
             -Server ID: {}\n\
             -Order ID: {}\n\
             -Order Date: {}",
            transaction_id,
            order.game.display_name(),
            amount,
            order.product.name,
            order.user_id,
            order.effective_server_id(),
            order_id,
            order_date
        );

        Self {
            transaction_id,
            order_id,
            game: order.game.display_name().to_string(),
            amount,
            item: order.product.name.clone(),
            user_id: order.user_id.clone(),
            server_id: order.effective_server_id().to_string(),
            order_date,
            main_message,
            order_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> OrderDescriptor {
        OrderDescriptor {
            game: Game::Mlbb,
            user_id: "123456789".to_string(),
            server_id: "1234".to_string(),
            nickname: None,
            product: Product {
                name: "86 Diamonds".to_string(),
                code: Some("86".to_string()),
                diamonds: Some(86),
                price: 1.24,
            },
            discount_percent: 0.0,
        }
    }

    #[test]
    fn test_final_amount_applies_discount_and_rounds() {
        let mut order = sample_order();
        order.discount_percent = 10.0;
        // 1.24 - 0.124 = 1.116 -> 1.12
        assert_eq!(order.final_amount(), 1.12);
    }

    #[test]
    fn test_freefire_server_id_is_zero() {
        let mut order = sample_order();
        order.game = Game::Freefire;
        order.server_id = "9999".to_string();
        assert_eq!(order.effective_server_id(), "0");
    }

    #[test]
    fn test_validate_rejects_non_numeric_user_id() {
        let mut order = sample_order();
        order.user_id = "abc".to_string();
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_too_small_amount() {
        let mut order = sample_order();
        order.discount_percent = 100.0;
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_order_data_messages() {
        let order = sample_order();
        let data = OrderData::for_order(&order);

        assert!(data.transaction_id.starts_with("tb"));
        assert_eq!(data.transaction_id.len(), 8);
        assert!(data.order_id.starts_with('S'));
        assert_eq!(data.main_message, "123456789 1234 86");
        assert!(data.order_message.starts_with("Top up successful✅"));
        assert!(data.order_message.contains("-Game: Mobile Legends"));
        assert!(data.order_message.contains("-User ID: 123456789"));
    }

    #[test]
    fn test_order_code_falls_back_to_diamonds() {
        let mut order = sample_order();
        order.product.code = None;
        assert_eq!(order.order_code(), "86");
    }
}
