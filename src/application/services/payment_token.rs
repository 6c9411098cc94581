//! One-time payment tokens
//!
//! A paid order is turned into a short-lived HS256 token carrying the order
//! payload. Validation consumes the token's jti, so a token authorizes
//! exactly one notification dispatch; replaying it fails with an
//! authentication error. Consumed jtis are kept until the token would have
//! expired anyway.

use crate::config::AppConfig;
use crate::domain::order::OrderData;
use crate::shared::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// Claims carried by a payment token
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentTokenClaims {
    /// Subject (transaction id)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at
    pub iat: usize,

    /// Expiration time
    pub exp: usize,

    /// Token ID (consumed on first validation)
    pub jti: String,

    /// Order payload resolved server-side
    pub order: OrderData,
}

/// Issues and validates one-time payment tokens
pub struct PaymentTokenService {
    config: Arc<AppConfig>,
    used: Mutex<HashMap<String, usize>>, // jti -> exp (unix seconds)
}

impl PaymentTokenService {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            used: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a token authorizing one notification dispatch for `order`
    pub fn issue(&self, order: &OrderData) -> AppResult<String> {
        let jwt = &self.config.security.jwt;
        let now = Utc::now();
        let expiration = now + Duration::seconds(jwt.token_ttl_seconds as i64);

        let claims = PaymentTokenClaims {
            sub: order.transaction_id.clone(),
            iss: jwt.issuer.clone(),
            aud: jwt.audience.clone(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            order: order.clone(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(jwt.secret_key.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("token generation failed: {}", e)))?;

        info!(transaction_id = %order.transaction_id, "payment token issued");
        Ok(token)
    }

    /// Validate a token and consume it. A second call with the same token
    /// fails.
    pub fn validate(&self, token: &str) -> AppResult<OrderData> {
        let jwt = &self.config.security.jwt;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&jwt.audience]);
        validation.set_issuer(&[&jwt.issuer]);

        let token_data = decode::<PaymentTokenClaims>(
            token,
            &DecodingKey::from_secret(jwt.secret_key.as_ref()),
            &validation,
        )
        .map_err(|e| {
            warn!(error = %e, "payment token validation failed");
            AppError::Authentication(format!("token validation failed: {}", e))
        })?;

        let claims = token_data.claims;
        let now = Utc::now().timestamp() as usize;

        let mut used = self.used.lock().unwrap();
        used.retain(|_, exp| *exp > now);
        if used.contains_key(&claims.jti) {
            return Err(AppError::Authentication("token already used".to_string()));
        }
        used.insert(claims.jti, claims.exp);

        Ok(claims.order)
    }

    /// Number of consumed, not-yet-expired jtis
    pub fn consumed_tokens(&self) -> usize {
        self.used.lock().unwrap().len()
    }
}
