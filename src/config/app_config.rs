//! Application configuration structures
//!
//! This module contains the main configuration structures for the application.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use validator::Validate;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server address to bind to
    pub bind_address: IpAddr,

    /// Server port
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    /// Maximum request size in bytes
    #[validate(range(min = 1024, max = 10485760))] // 1KB to 10MB
    pub max_request_size: usize,
}

/// Upstream provider configuration (KHQR generator and Bakong status API)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpstreamConfig {
    /// KHQR generation endpoint URL
    #[validate(url)]
    pub khqr_url: String,

    /// Bakong transaction-status endpoint URL
    #[validate(url)]
    pub bakong_url: String,

    /// Bearer token for the Bakong status API
    #[validate(length(min = 1))]
    pub bakong_api_token: String,

    /// Connection timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,

    /// Maximum retry attempts for QR generation
    #[validate(range(min = 0, max = 10))]
    pub max_retries: u32,
}

/// Telegram delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelegramConfig {
    /// Bot API base URL (overridable for tests)
    #[validate(url)]
    pub api_base: String,

    /// Bot token
    #[validate(length(min = 1))]
    pub bot_token: String,

    /// Main (operator log) channel id
    #[validate(length(min = 1))]
    pub main_chat_id: String,

    /// Orders channel id
    #[validate(length(min = 1))]
    pub orders_chat_id: String,

    /// Per-chat rate limit window in seconds
    #[validate(range(min = 1, max = 3600))]
    pub window_seconds: u64,

    /// Maximum messages per chat per window
    #[validate(range(min = 1, max = 1000))]
    pub max_per_window: u32,

    /// Maximum delivery retries before a message is dropped
    #[validate(range(min = 0, max = 10))]
    pub max_retries: u32,

    /// Queue drain tick in milliseconds
    #[validate(range(min = 100, max = 60000))]
    pub drain_tick_ms: u64,

    /// Queued messages older than this are discarded
    #[validate(range(min = 10, max = 3600))]
    pub stale_after_seconds: u64,
}

/// JWT configuration for one-time payment tokens
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JwtConfig {
    /// JWT secret key
    #[validate(length(min = 32))]
    pub secret_key: String,

    /// Token time-to-live in seconds
    #[validate(range(min = 60, max = 86400))]
    pub token_ttl_seconds: u64,

    /// JWT issuer
    #[validate(length(min = 1))]
    pub issuer: String,

    /// JWT audience
    #[validate(length(min = 1))]
    pub audience: String,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecurityConfig {
    /// Require signed checkout requests
    pub signing_enabled: bool,

    /// HMAC signing secret shared with the storefront
    #[validate(length(min = 32))]
    pub signing_secret: String,

    /// Replay window for signed requests in seconds
    #[validate(range(min = 30, max = 3600))]
    pub signature_timeout_seconds: u64,

    /// Nonce sweep interval in seconds
    #[validate(range(min = 10, max = 3600))]
    pub nonce_sweep_seconds: u64,

    /// One-time payment token configuration
    #[validate(nested)]
    pub jwt: JwtConfig,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateLimitConfig {
    /// Enable the global request limiter
    pub enabled: bool,

    /// Global requests per minute across all clients
    #[validate(range(min = 1, max = 100000))]
    pub requests_per_minute: u32,

    /// Fixed window length for per-key limiting, in seconds
    #[validate(range(min = 1, max = 3600))]
    pub window_seconds: u64,

    /// Maximum requests per key per window
    #[validate(range(min = 1, max = 10000))]
    pub max_requests: u32,

    /// Blacklist duration for escalated keys, in seconds
    #[validate(range(min = 60, max = 86400))]
    pub block_seconds: u64,
}

/// Payment verification flow configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FlowConfig {
    /// Cooldown between QR generations for one order, in seconds
    #[validate(range(min = 1, max = 3600))]
    pub qr_cooldown_seconds: u64,

    /// Delay before the first verification poll, in seconds
    #[validate(range(min = 1, max = 60))]
    pub first_poll_delay_seconds: u64,

    /// Interval between verification polls, in seconds
    #[validate(range(min = 1, max = 60))]
    pub poll_interval_seconds: u64,

    /// Hard verification timeout measured from the first poll, in seconds
    #[validate(range(min = 10, max = 600))]
    pub verification_timeout_seconds: u64,

    /// QR validity window measured from generation, in seconds
    #[validate(range(min = 60, max = 3600))]
    pub qr_expiry_seconds: u64,

    /// Upper bound on verification polls per flow
    #[validate(range(min = 1, max = 120))]
    pub max_verification_attempts: u32,
}

/// KHQR merchant account details sent with each QR generation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct KhqrAccountConfig {
    #[validate(length(min = 1))]
    pub bakong_account_id: String,

    #[validate(length(min = 1))]
    pub acc_name: String,

    #[validate(length(min = 1))]
    pub account_information: String,

    #[validate(length(min = 3, max = 3))]
    pub currency: String,

    #[validate(length(min = 1))]
    pub address: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level
    #[validate(length(min = 1))]
    pub level: String,

    /// Log format
    #[validate(length(min = 1))]
    pub format: String,

    /// Enable structured logging
    pub structured: bool,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Upstream provider configuration
    pub upstream: UpstreamConfig,

    /// Telegram delivery configuration
    pub telegram: TelegramConfig,

    /// Security configuration
    pub security: SecurityConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Payment flow configuration
    pub flow: FlowConfig,

    /// KHQR merchant account details
    pub khqr_account: KhqrAccountConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".parse().unwrap(),
                port: 8080,
                max_request_size: 64 * 1024, // 64KB
            },
            upstream: UpstreamConfig {
                khqr_url: "https://khqr.example.com/api".to_string(),
                bakong_url: "https://api-bakong.nbc.gov.kh/v1/check_transaction_by_md5"
                    .to_string(),
                bakong_api_token: "replace-me".to_string(),
                timeout_seconds: 30,
                max_retries: 3,
            },
            telegram: TelegramConfig {
                api_base: "https://api.telegram.org".to_string(),
                bot_token: "replace-me".to_string(),
                main_chat_id: "replace-me".to_string(),
                orders_chat_id: "replace-me".to_string(),
                window_seconds: 60,
                max_per_window: 30,
                max_retries: 3,
                drain_tick_ms: 1000,
                stale_after_seconds: 300,
            },
            security: SecurityConfig {
                signing_enabled: false,
                signing_secret: "your-super-secret-signing-key-32-chars-min".to_string(),
                signature_timeout_seconds: 300,
                nonce_sweep_seconds: 60,
                jwt: JwtConfig {
                    secret_key: "your-super-secret-jwt-key-that-should-be-32-chars-min"
                        .to_string(),
                    token_ttl_seconds: 600,
                    issuer: "topup-gateway".to_string(),
                    audience: "topup-clients".to_string(),
                },
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                requests_per_minute: 1000,
                window_seconds: 60,
                max_requests: 5,
                block_seconds: 3600,
            },
            flow: FlowConfig {
                qr_cooldown_seconds: 180,
                first_poll_delay_seconds: 7,
                poll_interval_seconds: 5,
                verification_timeout_seconds: 60,
                qr_expiry_seconds: 300,
                max_verification_attempts: 12,
            },
            khqr_account: KhqrAccountConfig {
                bakong_account_id: "merchant@bank".to_string(),
                acc_name: "Merchant".to_string(),
                account_information: "0000000000".to_string(),
                currency: "USD".to_string(),
                address: "Phnom Penh".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                structured: true,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("Conf").required(false))
            .add_source(config::Environment::with_prefix("TOPUP").separator("__"))
            .build()
            .map_err(|e| {
                crate::shared::error::AppError::Config(format!(
                    "Failed to build configuration: {}",
                    e
                ))
            })?;

        let config: AppConfig = config.try_deserialize().map_err(|e| {
            crate::shared::error::AppError::Config(format!(
                "Failed to deserialize configuration: {}",
                e
            ))
        })?;

        // Validate configuration
        config.validate_config().map_err(|e| {
            crate::shared::error::AppError::Validation(format!(
                "Configuration validation failed: {}",
                e
            ))
        })?;

        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_config(&self) -> Result<(), validator::ValidationErrors> {
        self.server.validate()?;
        self.upstream.validate()?;
        self.telegram.validate()?;
        self.security.validate()?;
        self.rate_limit.validate()?;
        self.flow.validate()?;
        self.khqr_account.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_server_address() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_flow_config_rejected() {
        let mut config = AppConfig::default();
        config.flow.poll_interval_seconds = 0;
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = AppConfig::default();
        config.security.jwt.secret_key = "short".to_string();
        assert!(config.validate_config().is_err());
    }
}
